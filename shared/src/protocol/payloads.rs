use bytes::{BufMut, BytesMut};

use crate::{
    sequence::SeqNum,
    serde::{read_bytes, Serde, SerdeErr},
    types::PlayerId,
};

/// Body of `RegisterPlayer`, the join handshake sent by the hub:
/// `assignedId:u16 | epochMillis:i64 | syncSeq:u16 | bitsetLen:u8 | bitsetBytes`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterPlayer {
    pub assigned_id: PlayerId,
    /// The hub's session start, unix milliseconds
    pub epoch_millis: i64,
    /// Newest sequence number the hub has received contiguously on this link
    pub sync_seq: SeqNum,
    pub active_ids: Vec<u8>,
}

impl RegisterPlayer {
    /// Largest bitset the one-byte length prefix can describe
    pub const MAX_BITSET_LEN: usize = u8::MAX as usize;
}

impl Serde for RegisterPlayer {
    fn ser(&self, writer: &mut BytesMut) {
        let bitset_len = self.active_ids.len().min(Self::MAX_BITSET_LEN);
        self.assigned_id.ser(writer);
        self.epoch_millis.ser(writer);
        self.sync_seq.ser(writer);
        (bitset_len as u8).ser(writer);
        writer.put_slice(&self.active_ids[..bitset_len]);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        let assigned_id = u16::de(reader)?;
        let epoch_millis = i64::de(reader)?;
        let sync_seq = u16::de(reader)?;
        let bitset_len = u8::de(reader)?;
        let active_ids = read_bytes(reader, usize::from(bitset_len))?.to_vec();
        Ok(Self {
            assigned_id,
            epoch_millis,
            sync_seq,
            active_ids,
        })
    }

    fn byte_length(&self) -> usize {
        2 + 8 + 2 + 1 + self.active_ids.len().min(Self::MAX_BITSET_LEN)
    }
}

/// Body of `NotifyAddPlayer`, `NotifyRemovePlayer` and `UnregisterPlayer`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlayerNotice {
    pub id: PlayerId,
}

impl Serde for PlayerNotice {
    fn ser(&self, writer: &mut BytesMut) {
        self.id.ser(writer);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: u16::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        2
    }
}

/// Body of `StopNetwork`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StopNetwork {
    pub error_code: u8,
}

impl Serde for StopNetwork {
    fn ser(&self, writer: &mut BytesMut) {
        self.error_code.ser(writer);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        Ok(Self {
            error_code: u8::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        1
    }
}

/// Serializes a payload into a fresh buffer.
pub fn to_body<T: Serde>(payload: &T) -> Vec<u8> {
    let mut writer = BytesMut::with_capacity(payload.byte_length());
    payload.ser(&mut writer);
    writer.to_vec()
}

/// Deserializes a payload from a packet body.
pub fn from_body<T: Serde>(body: &[u8]) -> Result<T, SerdeErr> {
    let mut reader = body;
    T::de(&mut reader)
}
