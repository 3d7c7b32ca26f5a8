const SAMPLE_COUNT: usize = 16;

/// Rolling mean over the most recent one-way latency samples, in
/// milliseconds.
pub struct LatencyRing {
    samples: [u16; SAMPLE_COUNT],
    next: usize,
    filled: usize,
}

impl LatencyRing {
    pub fn new() -> Self {
        Self {
            samples: [0; SAMPLE_COUNT],
            next: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, sample: u16) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % SAMPLE_COUNT;
        self.filled = (self.filled + 1).min(SAMPLE_COUNT);
    }

    /// Mean of the recorded samples, 0 before the first one
    pub fn mean(&self) -> u16 {
        if self.filled == 0 {
            return 0;
        }
        let sum: u32 = self.samples[..self.filled].iter().map(|s| u32::from(*s)).sum();
        (sum / self.filled as u32) as u16
    }
}

impl Default for LatencyRing {
    fn default() -> Self {
        Self::new()
    }
}
