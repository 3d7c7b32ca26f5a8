use bytes::BytesMut;

use crate::{
    protocol::qos::QosType,
    sequence::SeqNum,
    serde::{Serde, SerdeErr},
};

/// Prefix of every physical datagram: `qos:u8 | seq:u16 | ack:u16`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QosHeader {
    pub qos: QosType,
    /// Sender's sequence number for this datagram (reliable only, 0 otherwise
    /// for latency probes)
    pub seq: SeqNum,
    /// Newest sequence number the sender has received contiguously
    pub ack: SeqNum,
}

impl QosHeader {
    pub const SIZE: usize = 5;

    pub fn new(qos: QosType, seq: SeqNum, ack: SeqNum) -> Self {
        Self { qos, seq, ack }
    }
}

impl Serde for QosHeader {
    fn ser(&self, writer: &mut BytesMut) {
        self.qos.ser(writer);
        self.seq.ser(writer);
        self.ack.ser(writer);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        let qos = QosType::de(reader)?;
        let seq = u16::de(reader)?;
        let ack = u16::de(reader)?;
        Ok(Self { qos, seq, ack })
    }

    fn byte_length(&self) -> usize {
        Self::SIZE
    }
}
