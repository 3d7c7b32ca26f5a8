use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// Raised when a buffer ends early or carries a value that has no meaning on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed or truncated wire data")]
pub struct SerdeErr;

/// Little-endian byte serialization used for every header and payload.
pub trait Serde: Sized {
    /// Append this value to `writer`
    fn ser(&self, writer: &mut BytesMut);
    /// Read a value from the front of `reader`, advancing it
    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr>;
    /// Number of bytes `ser` will write
    fn byte_length(&self) -> usize;
}

fn ensure(reader: &[u8], len: usize) -> Result<(), SerdeErr> {
    if reader.remaining() < len {
        return Err(SerdeErr);
    }
    Ok(())
}

impl Serde for u8 {
    fn ser(&self, writer: &mut BytesMut) {
        writer.put_u8(*self);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        ensure(*reader, 1)?;
        Ok(reader.get_u8())
    }

    fn byte_length(&self) -> usize {
        1
    }
}

impl Serde for u16 {
    fn ser(&self, writer: &mut BytesMut) {
        writer.put_u16_le(*self);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        ensure(*reader, 2)?;
        Ok(reader.get_u16_le())
    }

    fn byte_length(&self) -> usize {
        2
    }
}

impl Serde for i64 {
    fn ser(&self, writer: &mut BytesMut) {
        writer.put_i64_le(*self);
    }

    fn de(reader: &mut &[u8]) -> Result<Self, SerdeErr> {
        ensure(*reader, 8)?;
        Ok(reader.get_i64_le())
    }

    fn byte_length(&self) -> usize {
        8
    }
}

/// Splits `len` bytes off the front of `reader`.
pub fn read_bytes<'a>(reader: &mut &'a [u8], len: usize) -> Result<&'a [u8], SerdeErr> {
    if reader.len() < len {
        return Err(SerdeErr);
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head)
}
