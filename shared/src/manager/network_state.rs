/// Lifecycle of a network manager, and of each player slot a hub tracks
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NetworkState {
    #[default]
    Offline,
    /// Waiting for the transport or the join handshake. For a hub's player
    /// slot: the transport dropped and the slot awaits a reconnect.
    Connecting,
    Online,
    /// `stop` was requested and peers are being drained
    Disconnecting,
}
