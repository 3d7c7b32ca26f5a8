use bytes::{BufMut, BytesMut};

use crate::{
    serde::{Serde, SerdeErr},
    types::PlayerId,
};

/// Logical packet carried inside a chunk entry:
/// `targetId:u16 | senderId:u16 | type:u8 | body`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub target_id: PlayerId,
    pub sender_id: PlayerId,
    pub kind: u8,
    pub body: &'a [u8],
}

impl<'a> Envelope<'a> {
    pub const HEADER_SIZE: usize = 5;

    pub fn new(target_id: PlayerId, sender_id: PlayerId, kind: u8, body: &'a [u8]) -> Self {
        Self {
            target_id,
            sender_id,
            kind,
            body,
        }
    }

    pub fn read(entry: &'a [u8]) -> Result<Self, SerdeErr> {
        let mut reader = entry;
        let target_id = u16::de(&mut reader)?;
        let sender_id = u16::de(&mut reader)?;
        let kind = u8::de(&mut reader)?;
        Ok(Self {
            target_id,
            sender_id,
            kind,
            body: reader,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BytesMut::with_capacity(Self::HEADER_SIZE + self.body.len());
        self.target_id.ser(&mut writer);
        self.sender_id.ser(&mut writer);
        self.kind.ser(&mut writer);
        writer.put_slice(self.body);
        writer.to_vec()
    }
}
