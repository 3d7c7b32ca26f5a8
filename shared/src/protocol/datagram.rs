use bytes::{BufMut, BytesMut};
use log::debug;

use crate::{
    protocol::{header::QosHeader, qos::QosType},
    sequence::SeqNum,
    serde::{read_bytes, Serde, SerdeErr},
};

/// Size of the length frame in front of every chunk entry
pub const CHUNK_LENGTH_SIZE: usize = 2;

/// A physical datagram taken off a link, owning its bytes (header included).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    header: QosHeader,
    bytes: Box<[u8]>,
}

impl Datagram {
    pub fn parse(bytes: Box<[u8]>) -> Result<Self, SerdeErr> {
        let mut reader: &[u8] = &bytes;
        let header = QosHeader::de(&mut reader)?;
        Ok(Self { header, bytes })
    }

    pub fn header(&self) -> &QosHeader {
        &self.header
    }

    pub fn qos(&self) -> QosType {
        self.header.qos
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length-framed entries following the header
    pub fn chunks(&self) -> ChunkIter<'_> {
        ChunkIter::new(&self.bytes[QosHeader::SIZE..])
    }
}

/// Walks `{length:u16, payload}` entries. Stops at a zero length, at the end
/// of the buffer, or at the first malformed frame.
pub struct ChunkIter<'a> {
    reader: &'a [u8],
}

impl<'a> ChunkIter<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self { reader: body }
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_empty() {
            return None;
        }
        let Ok(length) = u16::de(&mut self.reader) else {
            debug!("dangling byte after last chunk");
            self.reader = &[];
            return None;
        };
        if length == 0 {
            self.reader = &[];
            return None;
        }
        match read_bytes(&mut self.reader, usize::from(length)) {
            Ok(payload) => Some(payload),
            Err(_) => {
                debug!(
                    "chunk claims {} bytes but only {} remain",
                    length,
                    self.reader.len()
                );
                self.reader = &[];
                None
            }
        }
    }
}

/// Appends one length-framed entry. The caller guarantees `payload` fits a
/// u16 length.
pub fn write_chunk(writer: &mut BytesMut, payload: &[u8]) {
    (payload.len() as u16).ser(writer);
    writer.put_slice(payload);
}

/// A complete datagram carrying exactly one entry, used for unchunked sends.
pub fn encode_single(header: QosHeader, payload: &[u8]) -> Box<[u8]> {
    let mut writer = BytesMut::with_capacity(QosHeader::SIZE + CHUNK_LENGTH_SIZE + payload.len());
    header.ser(&mut writer);
    write_chunk(&mut writer, payload);
    writer.to_vec().into_boxed_slice()
}

/// A latency probe: header with `MeasureLatency` and the sender's freshest
/// ack, followed by the sender's wall clock in unix milliseconds.
pub fn encode_latency_probe(ack: SeqNum, timestamp_millis: i64) -> Box<[u8]> {
    let mut writer = BytesMut::with_capacity(QosHeader::SIZE + 8);
    QosHeader::new(QosType::MeasureLatency, 0, ack).ser(&mut writer);
    timestamp_millis.ser(&mut writer);
    writer.to_vec().into_boxed_slice()
}
