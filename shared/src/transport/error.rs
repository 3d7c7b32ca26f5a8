use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced by the datagram transport a link runs over
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not bind or listen at the requested address
    #[error("Failed to listen at {addr}. The address may be in use or unreachable")]
    ListenFailed { addr: SocketAddr },

    /// Could not open a connection to the remote address
    #[error("Failed to connect to {addr}")]
    ConnectFailed { addr: SocketAddr },

    /// The connection is closed or the datagram could not be handed to the socket
    #[error("Failed to send {len} bytes to {addr}")]
    SendFailed { addr: SocketAddr, len: usize },
}
