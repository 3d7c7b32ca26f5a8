/// Tunables for a single reliable link
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Upper bound in bytes for a chunked datagram, header included. A single
    /// entry larger than this still travels, alone, in its own datagram.
    pub target_packet_size: usize,
    /// Number of flushes a reliable datagram may stay unacknowledged before
    /// the link is reported as stalled
    pub timeout_frame_count: u16,
    /// Maximum number of out-of-order reliable datagrams held while waiting
    /// for a missing one. Datagrams further ahead are dropped.
    pub reorder_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            target_packet_size: 1400,
            timeout_frame_count: 300,
            reorder_capacity: 1024,
        }
    }
}
