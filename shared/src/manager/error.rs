use thiserror::Error;

use crate::{link::error::LinkError, types::PlayerId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("network is not online")]
    Offline,
    #[error("packet type {0} is reserved for built-in packets")]
    ReservedKind(u8),
    #[error("no player with id {0} is connected")]
    UnknownTarget(PlayerId),
    #[error(transparent)]
    Link(#[from] LinkError),
}
