use std::{net::SocketAddr, time::Instant};

use radome_shared::{LinkHandle, NetworkState};

/// The hub's record of one registered player
#[derive(Clone, Debug)]
pub struct PlayerSlot {
    pub(crate) state: NetworkState,
    /// `None` for the hub's own slot
    pub(crate) link: Option<LinkHandle>,
    pub(crate) remote_addr: SocketAddr,
    /// Set while the player's transport is down
    pub(crate) disconnect_deadline: Option<Instant>,
}

impl PlayerSlot {
    pub(crate) fn new(link: Option<LinkHandle>, remote_addr: SocketAddr) -> Self {
        Self {
            state: NetworkState::Online,
            link,
            remote_addr,
            disconnect_deadline: None,
        }
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn disconnect_deadline(&self) -> Option<Instant> {
        self.disconnect_deadline
    }

    pub(crate) fn hold_until(&mut self, deadline: Instant) {
        self.state = NetworkState::Connecting;
        self.disconnect_deadline = Some(deadline);
    }

    pub(crate) fn resume(&mut self) {
        self.state = NetworkState::Online;
        self.disconnect_deadline = None;
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.state == NetworkState::Connecting
            && self.disconnect_deadline.is_some_and(|deadline| now >= deadline)
    }
}
