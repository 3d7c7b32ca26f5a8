use thiserror::Error;

use radome_shared::TransportError;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub is already running")]
    AlreadyStarted,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
