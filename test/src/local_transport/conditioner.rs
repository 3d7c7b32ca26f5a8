use std::collections::VecDeque;

use crate::local_transport::Item;

/// How an in-memory link misbehaves. Probabilities are per datagram.
#[derive(Clone, Debug, Default)]
pub struct LinkConditionerConfig {
    pub loss: f32,
    pub duplicate: f32,
    /// Chance that a datagram jumps ahead of others already in flight
    pub reorder: f32,
}

impl LinkConditionerConfig {
    pub fn perfect() -> Self {
        Self::default()
    }

    pub fn poor() -> Self {
        Self {
            loss: 0.1,
            duplicate: 0.05,
            reorder: 0.2,
        }
    }
}

pub struct LinkConditioner {
    config: LinkConditionerConfig,
    rng: fastrand::Rng,
}

impl LinkConditioner {
    pub fn new(config: LinkConditionerConfig, seed: u64) -> Self {
        Self {
            config,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn set_config(&mut self, config: LinkConditionerConfig) {
        self.config = config;
    }

    pub(crate) fn deliver(&mut self, queue: &mut VecDeque<Item>, datagram: &[u8]) {
        if self.rng.f32() < self.config.loss {
            return;
        }
        let copies = if self.rng.f32() < self.config.duplicate { 2 } else { 1 };
        for _ in 0..copies {
            let item = Item::Data(datagram.to_vec());
            if !queue.is_empty() && self.rng.f32() < self.config.reorder {
                let position = self.rng.usize(0..queue.len());
                queue.insert(position, item);
            } else {
                queue.push_back(item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(queue: &VecDeque<Item>) -> Vec<u8> {
        queue
            .iter()
            .filter_map(|item| match item {
                Item::Data(bytes) => Some(bytes[0]),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn perfect_link_is_fifo() {
        let mut conditioner = LinkConditioner::new(LinkConditionerConfig::perfect(), 1);
        let mut queue = VecDeque::new();
        for tag in 0..10u8 {
            conditioner.deliver(&mut queue, &[tag]);
        }
        assert_eq!(data(&queue), (0..10).collect::<Vec<u8>>());
    }

    #[test]
    fn total_loss_delivers_nothing() {
        let config = LinkConditionerConfig {
            loss: 1.0,
            ..Default::default()
        };
        let mut conditioner = LinkConditioner::new(config, 1);
        let mut queue = VecDeque::new();
        conditioner.deliver(&mut queue, &[1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn always_duplicate_doubles() {
        let config = LinkConditionerConfig {
            duplicate: 1.0,
            ..Default::default()
        };
        let mut conditioner = LinkConditioner::new(config, 1);
        let mut queue = VecDeque::new();
        conditioner.deliver(&mut queue, &[4]);
        assert_eq!(data(&queue), vec![4, 4]);
    }
}
