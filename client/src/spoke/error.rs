use thiserror::Error;

use radome_shared::TransportError;

#[derive(Debug, Error)]
pub enum SpokeError {
    #[error("spoke is already running")]
    AlreadyStarted,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
