use std::{net::SocketAddr, time::Instant};

use log::{debug, error, info, warn};

use radome_shared::{
    check_kind, from_body, to_body, BuiltInPacket, Connection, Envelope, Events, LinkHandle,
    LinkRegistry, Listener, NetworkManager, NetworkState, PlayerId, PlayerIdSet, PlayerNotice,
    Qos, RegisterPlayer, SendError, SeqNum, StopNetwork, Timestamp, BROADCAST_PLAYER_ID,
    HUB_PLAYER_ID,
};

use crate::hub::{error::HubError, hub_config::HubConfig, player_slot::PlayerSlot};

/// The session leader. Owns the player id space, accepts spokes and relays
/// every envelope not addressed to itself.
pub struct Hub {
    config: HubConfig,
    listener: Box<dyn Listener>,
    state: NetworkState,
    start_time: i64,
    links: LinkRegistry,
    player_ids: PlayerIdSet,
    slots: Vec<Option<PlayerSlot>>,
}

impl Hub {
    pub fn new(config: HubConfig, listener: Box<dyn Listener>) -> Self {
        let links = LinkRegistry::new(config.link.clone());
        Self {
            config,
            listener,
            state: NetworkState::Offline,
            start_time: 0,
            links,
            player_ids: PlayerIdSet::new(),
            slots: Vec::new(),
        }
    }

    /// Binds the listener and registers the hub itself as player 0.
    pub fn start(&mut self, addr: SocketAddr) -> Result<(), HubError> {
        if self.state != NetworkState::Offline {
            return Err(HubError::AlreadyStarted);
        }
        self.listener.listen(addr)?;

        self.state = NetworkState::Connecting;
        self.start_time = Timestamp::now_millis();
        self.player_ids.clear();
        self.player_ids.register(HUB_PLAYER_ID);
        self.slots.clear();
        self.slots.push(Some(PlayerSlot::new(None, addr)));
        info!("hub listening on {}", addr);
        Ok(())
    }

    pub fn slot(&self, id: PlayerId) -> Option<&PlayerSlot> {
        self.slots.get(usize::from(id)).and_then(Option::as_ref)
    }

    /// Mean latency of the link to `id`, in milliseconds
    pub fn latency(&self, id: PlayerId) -> Option<u16> {
        let handle = self.slot(id)?.link?;
        self.links.try_get(handle).map(|link| link.latency())
    }

    // Synchronous phase

    fn accept_connections(&mut self, events: &mut Events) {
        while let Some(mut connection) = self.listener.accept() {
            let remote_addr = connection.remote_addr();
            if self.state == NetworkState::Disconnecting {
                info!("refusing {} while shutting down", remote_addr);
                connection.disconnect();
                // a held slot coming back is done with the session
                if let Some(id) = self.find_by_addr(remote_addr) {
                    self.unregister_player(id, events);
                }
                if self.state == NetworkState::Offline {
                    return;
                }
                continue;
            }

            if self.state == NetworkState::Connecting {
                self.state = NetworkState::Online;
            }
            match self.find_by_addr(remote_addr) {
                Some(id) => {
                    info!("accepted a reconnection from {}, player {}", remote_addr, id);
                    self.reconnect_player(id, connection, events);
                }
                None => {
                    let id = self.player_ids.first_free();
                    info!("accepted a connection from {}, player {}", remote_addr, id);
                    self.register_player(id, connection, events);
                }
            }
        }
    }

    fn find_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.slots.iter().enumerate().find_map(|(id, slot)| {
            let handle = slot.as_ref()?.link?;
            let link = self.links.try_get(handle)?;
            (link.remote_addr() == addr).then_some(id as PlayerId)
        })
    }

    fn register_player(
        &mut self,
        id: PlayerId,
        mut connection: Box<dyn Connection>,
        events: &mut Events,
    ) {
        // the newcomer learns the membership it is joining
        let active_ids = self.player_ids.as_bytes().to_vec();
        if let Err(err) = self.player_ids.try_register(id) {
            error!("refusing {}: {}", connection.remote_addr(), err);
            connection.disconnect();
            return;
        }

        let remote_addr = connection.remote_addr();
        let handle = self.links.acquire(connection);
        let slot = Some(PlayerSlot::new(Some(handle), remote_addr));
        let index = usize::from(id);
        if index == self.slots.len() {
            self.slots.push(slot);
        } else {
            self.slots[index] = slot;
        }

        self.send_register_player(id, active_ids);
        let notice = to_body(&PlayerNotice { id });
        self.broadcast_built_in(BuiltInPacket::NotifyAddPlayer, &notice, Some(id), false);
        events.push_registration(id);
    }

    fn reconnect_player(
        &mut self,
        id: PlayerId,
        connection: Box<dyn Connection>,
        events: &mut Events,
    ) {
        let Some(slot) = self.slots[usize::from(id)].as_mut() else {
            return;
        };
        slot.resume();
        slot.remote_addr = connection.remote_addr();
        if let Some(handle) = slot.link {
            self.links.get_mut(handle).reconnect(connection);
        }
        let active_ids = self.player_ids.as_bytes().to_vec();
        self.send_register_player(id, active_ids);
        events.push_reconnection(id);
    }

    fn disconnect_player(&mut self, id: PlayerId, events: &mut Events) {
        if self.state == NetworkState::Disconnecting {
            // peers leaving during shutdown are not coming back
            self.unregister_player(id, events);
            return;
        }
        let deadline = Instant::now() + self.config.registration_timeout;
        if let Some(slot) = self.slots[usize::from(id)].as_mut() {
            info!("player {} disconnected, holding slot", id);
            slot.hold_until(deadline);
        }
        events.push_disconnection(id);
    }

    fn unregister_player(&mut self, id: PlayerId, events: &mut Events) {
        if id == HUB_PLAYER_ID || !self.player_ids.is_active(id) {
            debug!("ignoring unregister of inactive player {}", id);
            return;
        }
        if let Err(err) = self.player_ids.try_unregister(id) {
            error!("{}", err);
            return;
        }
        info!("unregistered player {}", id);

        if let Some(slot) = self.slots[usize::from(id)].take() {
            if let Some(handle) = slot.link {
                self.links.release(handle);
            }
        }

        if self.state == NetworkState::Disconnecting {
            if self.player_ids.count_active() == 1 {
                self.stop_complete();
            }
        } else {
            let notice = to_body(&PlayerNotice { id });
            self.broadcast_built_in(BuiltInPacket::NotifyRemovePlayer, &notice, None, false);
        }
        events.push_unregistration(id);
    }

    fn evict_expired(&mut self, events: &mut Events) {
        let now = Instant::now();
        let expired: Vec<PlayerId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|slot| slot.is_expired(now)))
            .map(|(id, _)| id as PlayerId)
            .collect();
        for id in expired {
            info!("player {} did not reconnect in time", id);
            self.unregister_player(id, events);
        }
    }

    fn process_links(&mut self, events: &mut Events) {
        for index in 0..self.slots.len() {
            let id = index as PlayerId;
            let Some(handle) = self.slot(id).and_then(|slot| slot.link) else {
                continue;
            };
            let link = self.links.get_mut(handle);
            if link.is_disconnected() {
                self.disconnect_player(id, events);
                continue;
            }

            for datagram in link.take_received() {
                let Some(qos) = datagram.qos().qos() else {
                    continue;
                };
                for entry in datagram.chunks() {
                    let envelope = match Envelope::read(entry) {
                        Ok(envelope) => envelope,
                        Err(_) => {
                            debug!("player {} sent a truncated envelope", id);
                            break;
                        }
                    };

                    if envelope.target_id != HUB_PLAYER_ID {
                        self.relay(handle, envelope.target_id, entry, qos);
                    }
                    if envelope.target_id != HUB_PLAYER_ID
                        && envelope.target_id != BROADCAST_PLAYER_ID
                    {
                        continue;
                    }

                    if BuiltInPacket::from_u8(envelope.kind) == Some(BuiltInPacket::UnregisterPlayer)
                    {
                        self.handle_unregister_request(id, envelope.body, events);
                        break;
                    }
                    events.push_packet(envelope.sender_id, envelope.kind, envelope.body);
                }
                if self.slot(id).is_none() {
                    // the player left; the rest of its datagrams are moot
                    break;
                }
            }

            if self.state == NetworkState::Offline {
                return;
            }
        }
    }

    fn handle_unregister_request(&mut self, from: PlayerId, body: &[u8], events: &mut Events) {
        match from_body::<PlayerNotice>(body) {
            Ok(PlayerNotice { id }) if id == from => self.unregister_player(id, events),
            Ok(PlayerNotice { id }) => {
                warn!("player {} asked to unregister player {}, ignored", from, id)
            }
            Err(err) => debug!("bad unregister request from {}: {}", from, err),
        }
    }

    /// Forwards an envelope's bytes untouched. Broadcasts go to every link
    /// except the one they arrived on.
    fn relay(&mut self, from: LinkHandle, target: PlayerId, entry: &[u8], qos: Qos) {
        if target == BROADCAST_PLAYER_ID {
            for handle in self.slots.iter().flatten().filter_map(|slot| slot.link) {
                if handle == from {
                    continue;
                }
                if let Err(err) = self.links.get_mut(handle).send(entry, qos, false) {
                    warn!("relay failed: {}", err);
                }
            }
            return;
        }

        let Some(handle) = self.slot(target).and_then(|slot| slot.link) else {
            debug!("dropping envelope for unknown player {}", target);
            return;
        };
        if let Err(err) = self.links.get_mut(handle).send(entry, qos, false) {
            warn!("relay failed: {}", err);
        }
    }

    // Outgoing

    fn send_register_player(&mut self, id: PlayerId, active_ids: Vec<u8>) {
        let Some(handle) = self.slot(id).and_then(|slot| slot.link) else {
            return;
        };
        let payload = RegisterPlayer {
            assigned_id: id,
            epoch_millis: self.start_time,
            sync_seq: self.links.get(handle).other_seq(),
            active_ids,
        };
        let envelope = Envelope::new(
            id,
            HUB_PLAYER_ID,
            BuiltInPacket::RegisterPlayer.to_u8(),
            &to_body(&payload),
        )
        .to_bytes();
        if let Err(err) = self.links.get_mut(handle).send(&envelope, Qos::Reliable, false) {
            error!("could not send join packet to player {}: {}", id, err);
        }
    }

    fn broadcast_built_in(
        &mut self,
        kind: BuiltInPacket,
        body: &[u8],
        skip: Option<PlayerId>,
        no_chunk: bool,
    ) {
        let envelope =
            Envelope::new(BROADCAST_PLAYER_ID, HUB_PLAYER_ID, kind.to_u8(), body).to_bytes();
        for (id, slot) in self.slots.iter().enumerate() {
            if skip == Some(id as PlayerId) {
                continue;
            }
            let Some(handle) = slot.as_ref().and_then(|slot| slot.link) else {
                continue;
            };
            if let Err(err) = self.links.get_mut(handle).send(&envelope, Qos::Reliable, no_chunk) {
                error!("could not send {:?} to player {}: {}", kind, id, err);
            }
        }
    }

    fn link_for(&self, target: PlayerId) -> Result<LinkHandle, SendError> {
        self.slot(target)
            .and_then(|slot| slot.link)
            .ok_or(SendError::UnknownTarget(target))
    }
}

impl NetworkManager for Hub {
    fn receive(&mut self) -> Events {
        let mut events = Events::new();
        if self.state == NetworkState::Offline {
            return events;
        }

        for (_, link) in self.links.iter_mut() {
            link.complete_receive();
        }

        self.accept_connections(&mut events);
        self.evict_expired(&mut events);
        self.process_links(&mut events);
        events
    }

    fn send_all_packets(&mut self) {
        if self.state == NetworkState::Offline {
            return;
        }

        let flush = matches!(
            self.state,
            NetworkState::Online | NetworkState::Disconnecting
        );
        let scheduler = self.config.scheduler;
        let mut handles: Vec<LinkHandle> =
            self.links.iter_mut().map(|(handle, _)| handle).collect();
        // shuffle so no player's datagrams always leave first
        fastrand::shuffle(&mut handles);
        for handle in handles {
            let link = self.links.get_mut(handle);
            if flush {
                link.send_latency_probe();
                link.send_reliable_chunks();
            }
            link.begin_receive(&scheduler);
        }
    }

    fn send(
        &mut self,
        target: PlayerId,
        kind: u8,
        body: &[u8],
        qos: Qos,
        no_chunk: bool,
    ) -> Result<SeqNum, SendError> {
        if self.state == NetworkState::Offline {
            return Err(SendError::Offline);
        }
        check_kind(kind)?;
        if target == BROADCAST_PLAYER_ID {
            self.broadcast(kind, body, qos, no_chunk)?;
            return Ok(0);
        }

        let handle = self.link_for(target)?;
        let envelope = Envelope::new(target, HUB_PLAYER_ID, kind, body).to_bytes();
        Ok(self.links.get_mut(handle).send(&envelope, qos, no_chunk)?)
    }

    fn broadcast(&mut self, kind: u8, body: &[u8], qos: Qos, no_chunk: bool) -> Result<(), SendError> {
        if self.state == NetworkState::Offline {
            return Err(SendError::Offline);
        }
        check_kind(kind)?;

        let envelope = Envelope::new(BROADCAST_PLAYER_ID, HUB_PLAYER_ID, kind, body).to_bytes();
        for handle in self.slots.iter().flatten().filter_map(|slot| slot.link) {
            self.links.get_mut(handle).send(&envelope, qos, no_chunk)?;
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.state == NetworkState::Offline {
            error!("stop called on a hub that is not running");
            return;
        }

        self.state = NetworkState::Disconnecting;
        // players already away cannot hear the stop, let the next receive
        // evict them
        let now = Instant::now();
        for slot in self.slots.iter_mut().flatten() {
            if slot.state == NetworkState::Connecting {
                slot.hold_until(now);
            }
        }
        if self.player_ids.count_active() == 1 {
            self.stop_complete();
        } else {
            info!("hub stopping, notifying {} players", self.player_ids.count_active() - 1);
            let body = to_body(&StopNetwork::default());
            self.broadcast_built_in(BuiltInPacket::StopNetwork, &body, None, true);
        }
    }

    fn stop_complete(&mut self) {
        if self.state == NetworkState::Offline {
            error!("stop_complete called on a hub that is not running");
            return;
        }

        self.state = NetworkState::Offline;
        self.links.release_all();
        self.listener.close();
        self.slots.clear();
        self.player_ids.clear();
        info!("hub stopped");
    }

    fn state(&self) -> NetworkState {
        self.state
    }

    fn player_id(&self) -> PlayerId {
        HUB_PLAYER_ID
    }

    fn is_leader(&self) -> bool {
        true
    }

    fn leader_start_time(&self) -> i64 {
        self.start_time
    }

    fn player_count(&self) -> u16 {
        self.player_ids.count_active()
    }

    fn is_active_player(&self, id: PlayerId) -> bool {
        self.player_ids.is_active(id)
    }
}
