use log::debug;

use crate::{
    backends::Timestamp,
    manager::{
        error::SendError, events::Events, network_manager::NetworkManager,
        network_state::NetworkState,
    },
    protocol::qos::Qos,
    sequence::SeqNum,
    types::{PlayerId, HUB_PLAYER_ID},
};

/// Application-facing front for whichever network manager is running, if
/// any. Without one, this node behaves as a lone leader.
pub struct PacketManager {
    manager: Option<Box<dyn NetworkManager>>,
    start_time: i64,
}

impl PacketManager {
    pub fn new() -> Self {
        Self {
            manager: None,
            start_time: Timestamp::now_millis(),
        }
    }

    /// Installs `manager`, returning the one it replaces.
    pub fn set_manager(
        &mut self,
        manager: Box<dyn NetworkManager>,
    ) -> Option<Box<dyn NetworkManager>> {
        self.manager.replace(manager)
    }

    pub fn take_manager(&mut self) -> Option<Box<dyn NetworkManager>> {
        self.manager.take()
    }

    pub fn manager(&self) -> Option<&dyn NetworkManager> {
        self.manager.as_deref()
    }

    pub fn manager_mut(&mut self) -> Option<&mut (dyn NetworkManager + 'static)> {
        self.manager.as_deref_mut()
    }

    pub fn state(&self) -> NetworkState {
        self.manager
            .as_ref()
            .map_or(NetworkState::Offline, |manager| manager.state())
    }

    pub fn is_leader(&self) -> bool {
        self.manager
            .as_ref()
            .map_or(true, |manager| manager.is_leader())
    }

    pub fn player_id(&self) -> PlayerId {
        self.manager
            .as_ref()
            .map_or(HUB_PLAYER_ID, |manager| manager.player_id())
    }

    pub fn leader_start_time(&self) -> i64 {
        self.manager
            .as_ref()
            .map_or(self.start_time, |manager| manager.leader_start_time())
    }

    pub fn receive(&mut self) -> Events {
        match self.manager.as_mut() {
            Some(manager) => manager.receive(),
            None => Events::new(),
        }
    }

    pub fn send_all_packets(&mut self) {
        if let Some(manager) = self.manager.as_mut() {
            manager.send_all_packets();
        }
    }

    /// Returns `None` when there is no online manager to send through.
    pub fn send(
        &mut self,
        target: PlayerId,
        kind: u8,
        body: &[u8],
        qos: Qos,
        no_chunk: bool,
    ) -> Result<Option<SeqNum>, SendError> {
        match self.online_manager() {
            Some(manager) => manager.send(target, kind, body, qos, no_chunk).map(Some),
            None => Ok(None),
        }
    }

    pub fn broadcast(
        &mut self,
        kind: u8,
        body: &[u8],
        qos: Qos,
        no_chunk: bool,
    ) -> Result<(), SendError> {
        match self.online_manager() {
            Some(manager) => manager.broadcast(kind, body, qos, no_chunk),
            None => Ok(()),
        }
    }

    fn online_manager(&mut self) -> Option<&mut Box<dyn NetworkManager>> {
        match self.manager.as_mut() {
            Some(manager) if manager.state() != NetworkState::Offline => Some(manager),
            _ => {
                debug!("no online network manager, packet dropped");
                None
            }
        }
    }
}

impl Default for PacketManager {
    fn default() -> Self {
        Self::new()
    }
}
