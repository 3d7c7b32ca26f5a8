use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("payload of {len} bytes does not fit a single chunk entry (max {max})")]
    PayloadTooLarge { len: usize, max: usize },
}
