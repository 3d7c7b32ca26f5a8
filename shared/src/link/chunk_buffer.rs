use bytes::BytesMut;

use crate::{
    protocol::{
        datagram::{write_chunk, CHUNK_LENGTH_SIZE},
        header::QosHeader,
    },
    sequence::SeqNum,
    serde::Serde,
};

/// Outgoing entries of one QoS class, packed into datagram-sized chunks.
///
/// Each chunk starts with a `QosHeader` stamped when the chunk is opened,
/// followed by `{length:u16, payload}` entries.
pub struct ChunkBuffer {
    data: BytesMut,
    chunk_lengths: Vec<usize>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self {
            data: BytesMut::new(),
            chunk_lengths: Vec::new(),
        }
    }

    /// Appends `payload` to the open chunk, or opens a new one when the
    /// entry would push the open chunk past `target_size`. `open_chunk` is
    /// only called when a new chunk starts and returns its header.
    pub fn push(
        &mut self,
        payload: &[u8],
        target_size: usize,
        open_chunk: impl FnOnce() -> QosHeader,
    ) {
        let entry_length = CHUNK_LENGTH_SIZE + payload.len();
        let needs_new_chunk = match self.chunk_lengths.last() {
            None => true,
            Some(open_length) => open_length + entry_length > target_size,
        };
        if needs_new_chunk {
            open_chunk().ser(&mut self.data);
            self.chunk_lengths.push(QosHeader::SIZE);
        }

        write_chunk(&mut self.data, payload);
        if let Some(open_length) = self.chunk_lengths.last_mut() {
            *open_length += entry_length;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_lengths.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_lengths.len()
    }

    /// Rewrites the sequence number of every pending chunk, starting at
    /// `first` and counting up.
    pub fn restamp(&mut self, first: SeqNum) {
        let mut offset = 0;
        let mut seq = first;
        for length in &self.chunk_lengths {
            stamp_seq(&mut self.data[offset..offset + length], seq);
            seq = seq.wrapping_add(1);
            offset += length;
        }
    }

    /// Splits the buffered chunks into finished datagrams, leaving the buffer
    /// empty.
    pub fn take_datagrams(&mut self) -> Vec<Box<[u8]>> {
        let datagrams = self
            .chunk_lengths
            .drain(..)
            .map(|length| self.data.split_to(length).to_vec().into_boxed_slice())
            .collect();
        self.data.clear();
        datagrams
    }
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Overwrites the `seq` field of an encoded `QosHeader`.
pub fn stamp_seq(datagram: &mut [u8], seq: SeqNum) {
    datagram[1..3].copy_from_slice(&seq.to_le_bytes());
}
