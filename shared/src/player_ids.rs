use thiserror::Error;

use crate::{protocol::payloads::RegisterPlayer, types::PlayerId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerIdError {
    #[error("cannot register player {id}: the set only grows one byte at a time and holds {len} bytes")]
    Discontiguous { id: PlayerId, len: usize },
    #[error("cannot register player {id}: the set is limited to {max} bytes")]
    CapacityExceeded { id: PlayerId, max: usize },
    #[error("cannot unregister player {id}: the set holds {len} bytes")]
    OutOfRange { id: PlayerId, len: usize },
}

/// Active player ids as a little-endian bitset: id `n` is bit `n % 8` of
/// byte `n / 8`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerIdSet {
    bytes: Vec<u8>,
}

impl PlayerIdSet {
    /// Largest set that still fits a `RegisterPlayer` payload
    pub const MAX_BYTES: usize = RegisterPlayer::MAX_BITSET_LEN;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_active(&self, id: PlayerId) -> bool {
        let (index, bit) = locate(id);
        self.bytes.get(index).is_some_and(|byte| byte & bit != 0)
    }

    pub fn try_register(&mut self, id: PlayerId) -> Result<(), PlayerIdError> {
        let (index, bit) = locate(id);
        if index >= Self::MAX_BYTES {
            return Err(PlayerIdError::CapacityExceeded {
                id,
                max: Self::MAX_BYTES,
            });
        }
        if index > self.bytes.len() {
            return Err(PlayerIdError::Discontiguous {
                id,
                len: self.bytes.len(),
            });
        }
        if index == self.bytes.len() {
            self.bytes.push(bit);
        } else {
            self.bytes[index] |= bit;
        }
        Ok(())
    }

    /// Panics if `id` lies beyond the byte after the current end.
    pub fn register(&mut self, id: PlayerId) {
        if let Err(err) = self.try_register(id) {
            panic!("{}", err);
        }
    }

    pub fn try_unregister(&mut self, id: PlayerId) -> Result<(), PlayerIdError> {
        let (index, bit) = locate(id);
        let len = self.bytes.len();
        let byte = self
            .bytes
            .get_mut(index)
            .ok_or(PlayerIdError::OutOfRange { id, len })?;
        *byte &= !bit;
        Ok(())
    }

    /// Panics if `id` lies outside the set.
    pub fn unregister(&mut self, id: PlayerId) {
        if let Err(err) = self.try_unregister(id) {
            panic!("{}", err);
        }
    }

    pub fn count_active(&self) -> u16 {
        self.bytes.iter().map(|byte| byte.count_ones() as u16).sum()
    }

    /// Lowest id that is not active
    pub fn first_free(&self) -> PlayerId {
        let mut id = 0;
        while self.is_active(id) {
            id += 1;
        }
        id
    }

    /// Active ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.bytes.iter().enumerate().flat_map(|(index, byte)| {
            (0..8u16)
                .filter(move |bit| byte & (1 << bit) != 0)
                .map(move |bit| index as u16 * 8 + bit)
        })
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

fn locate(id: PlayerId) -> (usize, u8) {
    (usize::from(id / 8), 1 << (id % 8))
}
