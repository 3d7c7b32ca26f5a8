use std::{mem, net::SocketAddr};

use log::{debug, error, info, warn};

use radome_shared::{
    check_kind, from_body, to_body, BuiltInPacket, Connector, Envelope, Events, LinkHandle,
    LinkRegistry, NetworkManager, NetworkState, PlayerId, PlayerIdSet, PlayerNotice, Qos,
    RegisterPlayer, SendError, SeqNum, BROADCAST_PLAYER_ID, HUB_PLAYER_ID,
};

use crate::spoke::{error::SpokeError, spoke_config::SpokeConfig};

/// A membership change announced by the hub
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Notice {
    Add(PlayerId),
    Remove(PlayerId),
}

/// A non-leader member of a session. Holds one link, to the hub, and learns
/// its player id and the membership set from the hub's join packet.
pub struct Spoke {
    config: SpokeConfig,
    connector: Box<dyn Connector>,
    state: NetworkState,
    hub_addr: Option<SocketAddr>,
    player_id: PlayerId,
    leader_start_time: i64,
    links: LinkRegistry,
    link: Option<LinkHandle>,
    player_ids: PlayerIdSet,
    /// Notices that arrived while not `Online`, in arrival order
    early_notices: Vec<Notice>,
}

impl Spoke {
    pub fn new(config: SpokeConfig, connector: Box<dyn Connector>) -> Self {
        let links = LinkRegistry::new(config.link.clone());
        Self {
            config,
            connector,
            state: NetworkState::Offline,
            hub_addr: None,
            player_id: HUB_PLAYER_ID,
            leader_start_time: 0,
            links,
            link: None,
            player_ids: PlayerIdSet::new(),
            early_notices: Vec::new(),
        }
    }

    /// Opens the link to the hub. The spoke is `Online` once the hub's join
    /// packet arrives.
    pub fn start(&mut self, hub_addr: SocketAddr) -> Result<(), SpokeError> {
        if self.state != NetworkState::Offline {
            return Err(SpokeError::AlreadyStarted);
        }
        let connection = self.connector.connect(hub_addr)?;
        self.link = Some(self.links.acquire(connection));
        self.hub_addr = Some(hub_addr);
        self.state = NetworkState::Connecting;
        info!("spoke connecting to {}", hub_addr);
        Ok(())
    }

    /// Mean latency of the link to the hub, in milliseconds
    pub fn latency(&self) -> Option<u16> {
        self.link
            .and_then(|handle| self.links.try_get(handle))
            .map(|link| link.latency())
    }

    fn reconnect(&mut self) {
        let (Some(handle), Some(hub_addr)) = (self.link, self.hub_addr) else {
            return;
        };
        self.state = NetworkState::Connecting;
        match self.connector.connect(hub_addr) {
            Ok(connection) => {
                info!("reconnecting to {}", hub_addr);
                self.links.get_mut(handle).reconnect(connection);
            }
            Err(err) => warn!("reconnect failed, retrying next tick: {}", err),
        }
    }

    fn process_entry(&mut self, entry: &[u8], events: &mut Events) {
        let envelope = match Envelope::read(entry) {
            Ok(envelope) => envelope,
            Err(_) => {
                debug!("hub sent a truncated envelope");
                return;
            }
        };

        match BuiltInPacket::from_u8(envelope.kind) {
            Some(BuiltInPacket::RegisterPlayer) => match from_body::<RegisterPlayer>(envelope.body)
            {
                Ok(join) if self.state == NetworkState::Disconnecting => {
                    // already leaving, only the sequence numbers still matter
                    self.sync_self_seq(join.sync_seq);
                }
                Ok(join) => self.complete_join(join, events),
                Err(err) => error!("bad join packet: {}", err),
            },
            Some(BuiltInPacket::NotifyAddPlayer) => match from_body::<PlayerNotice>(envelope.body)
            {
                Ok(PlayerNotice { id }) => self.receive_notice(Notice::Add(id), events),
                Err(err) => debug!("bad add notice: {}", err),
            },
            Some(BuiltInPacket::NotifyRemovePlayer) => {
                match from_body::<PlayerNotice>(envelope.body) {
                    Ok(PlayerNotice { id }) => self.receive_notice(Notice::Remove(id), events),
                    Err(err) => debug!("bad remove notice: {}", err),
                }
            }
            Some(BuiltInPacket::StopNetwork) => {
                info!("hub is shutting down");
                self.stop();
            }
            _ => events.push_packet(envelope.sender_id, envelope.kind, envelope.body),
        }
    }

    /// Adopts the id, epoch and membership carried by the hub's join
    /// packet.
    ///
    /// On a first join there is no earlier view: notices that beat the join
    /// packet are applied on top of its snapshot. On a rejoin the queued
    /// notices were sent while this spoke was away, before the snapshot was
    /// taken. They are played onto the old view in arrival order, then the
    /// snapshot settles whatever is left, so every change fires its event.
    fn complete_join(&mut self, join: RegisterPlayer, events: &mut Events) {
        let rejoin = self.player_id != HUB_PLAYER_ID;
        if rejoin {
            info!("rejoined as player {}", join.assigned_id);
        } else {
            info!("joined as player {}", join.assigned_id);
        }
        self.state = NetworkState::Online;
        self.player_id = join.assigned_id;
        self.leader_start_time = join.epoch_millis;
        self.sync_self_seq(join.sync_seq);

        let mut snapshot = PlayerIdSet::from_bytes(&join.active_ids);
        if !snapshot.is_active(self.player_id) {
            if let Err(err) = snapshot.try_register(self.player_id) {
                error!("{}", err);
            }
        }

        let notices = mem::take(&mut self.early_notices);
        if rejoin {
            for notice in notices {
                self.apply_notice(notice, events);
            }
            self.settle_membership(snapshot, events);
        } else {
            self.player_ids = snapshot;
            for notice in notices {
                self.apply_notice(notice, events);
            }
        }
    }

    fn sync_self_seq(&mut self, seq: SeqNum) {
        if let Some(handle) = self.link {
            self.links.get_mut(handle).sync_self_seq(seq);
        }
    }

    /// Replaces the membership view with `snapshot`, firing an event for
    /// every id that differs.
    fn settle_membership(&mut self, snapshot: PlayerIdSet, events: &mut Events) {
        let left: Vec<PlayerId> = self
            .player_ids
            .iter()
            .filter(|id| !snapshot.is_active(*id))
            .collect();
        let joined: Vec<PlayerId> = snapshot
            .iter()
            .filter(|id| !self.player_ids.is_active(*id))
            .collect();
        self.player_ids = snapshot;

        for id in left.into_iter().filter(|id| *id != self.player_id) {
            events.push_unregistration(id);
        }
        for id in joined.into_iter().filter(|id| *id != self.player_id) {
            events.push_registration(id);
        }
    }

    fn receive_notice(&mut self, notice: Notice, events: &mut Events) {
        if self.state == NetworkState::Online {
            self.apply_notice(notice, events);
        } else {
            self.early_notices.push(notice);
        }
    }

    fn apply_notice(&mut self, notice: Notice, events: &mut Events) {
        match notice {
            Notice::Add(id) => self.add_player(id, events),
            Notice::Remove(id) => self.remove_player(id, events),
        }
    }

    fn add_player(&mut self, id: PlayerId, events: &mut Events) {
        if id == self.player_id || self.player_ids.is_active(id) {
            return;
        }
        match self.player_ids.try_register(id) {
            Ok(()) => events.push_registration(id),
            Err(err) => error!("{}", err),
        }
    }

    fn remove_player(&mut self, id: PlayerId, events: &mut Events) {
        if id == self.player_id || !self.player_ids.is_active(id) {
            return;
        }
        match self.player_ids.try_unregister(id) {
            Ok(()) => events.push_unregistration(id),
            Err(err) => error!("{}", err),
        }
    }
}

impl NetworkManager for Spoke {
    fn receive(&mut self) -> Events {
        let mut events = Events::new();
        if self.state == NetworkState::Offline {
            return events;
        }
        let Some(handle) = self.link else {
            return events;
        };

        let link = self.links.get_mut(handle);
        link.complete_receive();
        if link.is_connected() {
            debug!("transport connected to hub");
        }
        if link.is_disconnected() || !link.has_connection() {
            if self.state == NetworkState::Disconnecting {
                self.stop_complete();
            } else {
                self.reconnect();
            }
            return events;
        }

        for datagram in link.take_received() {
            for entry in datagram.chunks() {
                self.process_entry(entry, &mut events);
                if self.state == NetworkState::Offline {
                    return events;
                }
            }
        }
        events
    }

    fn send_all_packets(&mut self) {
        if self.state == NetworkState::Offline {
            return;
        }
        let Some(handle) = self.link else {
            return;
        };

        let link = self.links.get_mut(handle);
        if matches!(
            self.state,
            NetworkState::Online | NetworkState::Disconnecting
        ) {
            link.send_latency_probe();
            link.send_reliable_chunks();
        }
        link.begin_receive(&self.config.scheduler);
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
        let handle = self.link.ok_or(SendError::Offline)?;

        // every envelope goes to the hub, which relays it onward
        let envelope = Envelope::new(target, self.player_id, kind, body).to_bytes();
        Ok(self.links.get_mut(handle).send(&envelope, qos, no_chunk)?)
    }

    fn broadcast(&mut self, kind: u8, body: &[u8], qos: Qos, no_chunk: bool) -> Result<(), SendError> {
        self.send(BROADCAST_PLAYER_ID, kind, body, qos, no_chunk)
            .map(|_| ())
    }

    fn stop(&mut self) {
        if self.state == NetworkState::Offline {
            error!("stop called on a spoke that is not running");
            return;
        }
        if self.state == NetworkState::Disconnecting {
            debug!("spoke is already stopping");
            return;
        }
        let Some(handle) = self.link else {
            self.stop_complete();
            return;
        };
        if self.player_id == HUB_PLAYER_ID || !self.links.get(handle).has_connection() {
            // never joined, or nothing left to carry the leave request
            self.stop_complete();
            return;
        }

        // mid-reconnect too: the hub reads it once the new connection is
        // accepted
        self.state = NetworkState::Disconnecting;
        let body = to_body(&PlayerNotice { id: self.player_id });
        let envelope = Envelope::new(
            HUB_PLAYER_ID,
            self.player_id,
            BuiltInPacket::UnregisterPlayer.to_u8(),
            &body,
        )
        .to_bytes();
        if let Err(err) = self.links.get_mut(handle).send(&envelope, Qos::Reliable, false) {
            error!("could not send leave request: {}", err);
        }
        info!("spoke stopping");
    }

    fn stop_complete(&mut self) {
        if self.state == NetworkState::Offline {
            error!("stop_complete called on a spoke that is not running");
            return;
        }

        self.state = NetworkState::Offline;
        self.links.release_all();
        self.link = None;
        self.player_id = HUB_PLAYER_ID;
        self.player_ids.clear();
        self.early_notices.clear();
        info!("spoke stopped");
    }

    fn state(&self) -> NetworkState {
        self.state
    }

    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn is_leader(&self) -> bool {
        false
    }

    fn leader_start_time(&self) -> i64 {
        self.leader_start_time
    }

    fn player_count(&self) -> u16 {
        self.player_ids.count_active()
    }

    fn is_active_player(&self, id: PlayerId) -> bool {
        self.player_ids.is_active(id)
    }
}
