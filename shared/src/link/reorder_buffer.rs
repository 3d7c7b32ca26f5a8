use std::collections::VecDeque;

/// Result of parking an out-of-order datagram
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parked {
    Stored,
    /// The slot already holds a copy; the new one was discarded
    Duplicate,
    /// The datagram is further ahead than the buffer can hold
    OverCapacity,
}

#[derive(Copy, Clone)]
struct Span {
    start: usize,
    len: usize,
}

/// Holds reliable datagrams that arrived ahead of a gap.
///
/// Slot `i` holds the datagram numbered `last_accepted + 2 + i`. Incoming
/// bytes are only borrowed from the transport, so stored datagrams are
/// copied into a carry-over arena that is compacted between receive passes.
pub struct ReorderBuffer {
    carry_over: Vec<u8>,
    slots: VecDeque<Option<Span>>,
    capacity: usize,
}

impl ReorderBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            carry_over: Vec::new(),
            slots: VecDeque::new(),
            capacity,
        }
    }

    pub fn park(&mut self, index: usize, datagram: &[u8]) -> Parked {
        if index >= self.capacity {
            return Parked::OverCapacity;
        }
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        if self.slots[index].is_some() {
            return Parked::Duplicate;
        }

        let start = self.carry_over.len();
        self.carry_over.extend_from_slice(datagram);
        self.slots[index] = Some(Span {
            start,
            len: datagram.len(),
        });
        Parked::Stored
    }

    /// Moves the window forward after the next expected datagram was
    /// accepted, returning every parked datagram that is now contiguous, in
    /// order.
    pub fn advance(&mut self) -> Vec<Box<[u8]>> {
        let mut ready = Vec::new();
        while let Some(slot) = self.slots.pop_front() {
            match slot {
                Some(span) => ready.push(
                    self.carry_over[span.start..span.start + span.len]
                        .to_vec()
                        .into_boxed_slice(),
                ),
                // the gap now sits right after the last accepted datagram
                None => break,
            }
        }
        ready
    }

    /// Number of datagrams currently parked
    pub fn parked(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Rebuilds the arena so it only holds bytes still referenced by a slot.
    pub fn compact(&mut self) {
        if self.slots.is_empty() {
            self.carry_over.clear();
            return;
        }
        let mut compacted = Vec::with_capacity(self.slots.iter().flatten().map(|s| s.len).sum());
        for span in self.slots.iter_mut().flatten() {
            let start = compacted.len();
            compacted.extend_from_slice(&self.carry_over[span.start..span.start + span.len]);
            span.start = start;
        }
        self.carry_over = compacted;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.carry_over.clear();
    }
}
