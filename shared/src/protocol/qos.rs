use bytes::BytesMut;

use crate::serde::{Serde, SerdeErr};

/// Delivery class an application picks when sending.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Qos {
    /// Fire-and-forget, never resent, never ordered
    Unreliable,
    /// Sequenced, acknowledged, resent until acknowledged, delivered in order
    Reliable,
}

/// The first byte of every physical datagram.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QosType {
    Reliable,
    Unreliable,
    /// Unchunked latency probe carrying a wall-clock timestamp
    MeasureLatency,
}

impl QosType {
    // 0 (empty) and 3 (chunk end) are reserved markers and are never valid
    // as a datagram's first byte.
    pub fn to_u8(self) -> u8 {
        match self {
            QosType::Reliable => 1,
            QosType::Unreliable => 2,
            QosType::MeasureLatency => 4,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, SerdeErr> {
        match value {
            1 => Ok(QosType::Reliable),
            2 => Ok(QosType::Unreliable),
            4 => Ok(QosType::MeasureLatency),
            _ => Err(SerdeErr),
        }
    }

    /// The application-facing class of this datagram, if it carries
    /// application data at all
    pub fn qos(self) -> Option<Qos> {
        match self {
            QosType::Reliable => Some(Qos::Reliable),
            QosType::Unreliable => Some(Qos::Unreliable),
            QosType::MeasureLatency => None,
        }
    }
}

impl From<Qos> for QosType {
    fn from(qos: Qos) -> Self {
        match qos {
            Qos::Unreliable => QosType::Unreliable,
            Qos::Reliable => QosType::Reliable,
        }
    }
}

impl Serde for QosType {
    fn ser(&self, writer: &mut BytesMut) {
        self.to_u8().ser(writer);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        QosType::from_u8(u8::de(reader)?)
    }

    fn byte_length(&self) -> usize {
        1
    }
}
