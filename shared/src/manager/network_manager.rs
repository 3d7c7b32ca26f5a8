use crate::{
    manager::{error::SendError, events::Events, network_state::NetworkState},
    protocol::{built_in::BuiltInPacket, qos::Qos},
    sequence::SeqNum,
    types::PlayerId,
};

/// Behaviour shared by the hub and the spoke.
///
/// A tick is `receive`, then any number of `send`/`broadcast` calls, then
/// `send_all_packets`.
pub trait NetworkManager {
    /// Waits for the previous tick's receive jobs and processes everything
    /// they delivered.
    fn receive(&mut self) -> Events;

    /// Flushes buffered data and schedules the next receive jobs.
    fn send_all_packets(&mut self);

    /// Sends an application packet to `target`. Returns the link's sequence
    /// number at the time of queueing.
    fn send(
        &mut self,
        target: PlayerId,
        kind: u8,
        body: &[u8],
        qos: Qos,
        no_chunk: bool,
    ) -> Result<SeqNum, SendError>;

    /// Sends an application packet to every other player.
    fn broadcast(&mut self, kind: u8, body: &[u8], qos: Qos, no_chunk: bool)
        -> Result<(), SendError>;

    /// Begins a graceful shutdown.
    fn stop(&mut self);

    /// Tears everything down once `stop` has drained.
    fn stop_complete(&mut self);

    fn state(&self) -> NetworkState;

    fn player_id(&self) -> PlayerId;

    fn is_leader(&self) -> bool;

    /// The hub's session epoch in unix milliseconds
    fn leader_start_time(&self) -> i64;

    fn player_count(&self) -> u16;

    fn is_active_player(&self, id: PlayerId) -> bool;
}

/// Application packet types live below the built-in range.
pub fn check_kind(kind: u8) -> Result<(), SendError> {
    if kind >= BuiltInPacket::FIRST {
        return Err(SendError::ReservedKind(kind));
    }
    Ok(())
}
