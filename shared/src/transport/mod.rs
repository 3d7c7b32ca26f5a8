//! The datagram transport the reliability engine runs over. Implementations
//! own sockets and connection bookkeeping; this crate only needs per-connection
//! send and event polling.

pub mod error;

use std::net::SocketAddr;

pub use error::TransportError;

/// Connection progress as reported by the transport
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// One pending event on a connection. `Data` borrows a receive buffer that the
/// transport may reuse on the next poll.
#[derive(Debug, PartialEq, Eq)]
pub enum TransportEvent<'a> {
    Connect,
    Disconnect,
    Data(&'a [u8]),
}

/// A single unreliable, unordered datagram connection.
pub trait Connection: Send {
    /// Hands one datagram to the transport
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
    /// Pops the next pending event, if any
    fn poll_event(&mut self) -> Option<TransportEvent<'_>>;
    fn state(&self) -> ConnectionState;
    fn remote_addr(&self) -> SocketAddr;
    /// Closes the connection; the remote end observes a `Disconnect`
    fn disconnect(&mut self);
}

/// Server side of a transport: binds, listens and hands out accepted
/// connections.
pub trait Listener: Send {
    fn listen(&mut self, addr: SocketAddr) -> Result<(), TransportError>;
    /// Next connection accepted since the last call
    fn accept(&mut self) -> Option<Box<dyn Connection>>;
    /// Stops accepting and releases the bound address
    fn close(&mut self);
}

/// Client side of a transport.
pub trait Connector: Send {
    fn connect(&mut self, addr: SocketAddr) -> Result<Box<dyn Connection>, TransportError>;
}
