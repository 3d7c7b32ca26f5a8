use std::collections::VecDeque;

use log::warn;

use crate::{
    link::chunk_buffer::stamp_seq,
    sequence::{is_resend_age, wrapping_diff, SeqNum},
};

struct UnackedDatagram {
    bytes: Box<[u8]>,
    age: u16,
}

/// Reliable datagrams sent but not yet acknowledged, oldest first.
///
/// Entries carry consecutive sequence numbers ending at the link's current
/// `self_seq`, so the oldest one is `self_seq - (len - 1)`.
pub struct UnackedList {
    entries: VecDeque<UnackedDatagram>,
    stalled: bool,
}

impl UnackedList {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            stalled: false,
        }
    }

    pub fn push(&mut self, bytes: Box<[u8]>) {
        self.entries.push_back(UnackedDatagram { bytes, age: 0 });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether some datagram has gone unacknowledged for longer than the
    /// configured timeout
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn oldest_seq(&self, self_seq: SeqNum) -> SeqNum {
        self_seq
            .wrapping_sub(self.entries.len() as u16)
            .wrapping_add(1)
    }

    /// Drops every entry numbered at or before `other_ack`, returning how
    /// many were released. An ack behind the oldest entry releases nothing.
    pub fn release_acked(&mut self, self_seq: SeqNum, other_ack: SeqNum) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let oldest = self.oldest_seq(self_seq);
        let acked = (wrapping_diff(oldest, other_ack) + 1).clamp(0, self.entries.len() as i32);
        let acked = acked as usize;
        self.entries.drain(..acked);
        if self.entries.is_empty() {
            self.stalled = false;
        }
        acked
    }

    /// Ages every entry by one flush, handing those at a resend age to
    /// `resend`.
    pub fn age_and_resend(&mut self, timeout_frame_count: u16, mut resend: impl FnMut(&[u8])) {
        let mut stalled = false;
        for entry in self.entries.iter_mut() {
            if entry.age > timeout_frame_count {
                stalled = true;
            }
            if is_resend_age(entry.age) {
                resend(&entry.bytes);
            }
            entry.age = entry.age.saturating_add(1);
        }
        if stalled && !self.stalled {
            warn!(
                "reliable datagram unacknowledged for more than {} flushes, {} pending",
                timeout_frame_count,
                self.entries.len()
            );
        }
        self.stalled = stalled;
    }

    /// Schedules every entry for resending on the next flush.
    pub fn reset_ages(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.age = 1;
        }
        self.stalled = false;
    }

    /// Renumbers the entries consecutively starting at `first`.
    pub fn restamp(&mut self, first: SeqNum) {
        let mut seq = first;
        for entry in self.entries.iter_mut() {
            stamp_seq(&mut entry.bytes, seq);
            seq = seq.wrapping_add(1);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stalled = false;
    }
}

impl Default for UnackedList {
    fn default() -> Self {
        Self::new()
    }
}
