use std::{mem, vec::IntoIter};

use crate::types::PlayerId;

/// An application packet delivered to this node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedPacket {
    pub sender: PlayerId,
    pub kind: u8,
    pub body: Box<[u8]>,
}

/// Everything that happened during one `receive` call. Read with
/// `events.read::<SomeEvent>()`.
#[derive(Debug, Default)]
pub struct Events {
    registrations: Vec<PlayerId>,
    unregistrations: Vec<PlayerId>,
    disconnections: Vec<PlayerId>,
    reconnections: Vec<PlayerId>,
    packets: Vec<ReceivedPacket>,

    empty: bool,
}

impl Events {
    pub fn new() -> Self {
        Self {
            empty: true,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: NetworkEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: NetworkEvent>(&self) -> bool {
        V::has(self)
    }

    // Used by network manager implementations

    pub fn push_registration(&mut self, id: PlayerId) {
        self.registrations.push(id);
        self.empty = false;
    }

    pub fn push_unregistration(&mut self, id: PlayerId) {
        self.unregistrations.push(id);
        self.empty = false;
    }

    pub fn push_disconnection(&mut self, id: PlayerId) {
        self.disconnections.push(id);
        self.empty = false;
    }

    pub fn push_reconnection(&mut self, id: PlayerId) {
        self.reconnections.push(id);
        self.empty = false;
    }

    pub fn push_packet(&mut self, sender: PlayerId, kind: u8, body: &[u8]) {
        self.packets.push(ReceivedPacket {
            sender,
            kind,
            body: body.into(),
        });
        self.empty = false;
    }
}

// Event Trait
pub trait NetworkEvent {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// A player joined the session
pub struct RegisterPlayerEvent;
impl NetworkEvent for RegisterPlayerEvent {
    type Iter = IntoIter<PlayerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.registrations).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.registrations.is_empty()
    }
}

// A player left, or its reconnection window ran out
pub struct UnregisterPlayerEvent;
impl NetworkEvent for UnregisterPlayerEvent {
    type Iter = IntoIter<PlayerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.unregistrations).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.unregistrations.is_empty()
    }
}

// Hub only: a player's transport dropped, its slot is held for reconnection
pub struct DisconnectPlayerEvent;
impl NetworkEvent for DisconnectPlayerEvent {
    type Iter = IntoIter<PlayerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// Hub only: a held slot was resumed by a new connection
pub struct ReconnectPlayerEvent;
impl NetworkEvent for ReconnectPlayerEvent {
    type Iter = IntoIter<PlayerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.reconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.reconnections.is_empty()
    }
}

pub struct PacketEvent;
impl NetworkEvent for PacketEvent {
    type Iter = IntoIter<ReceivedPacket>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.packets).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.packets.is_empty()
    }
}
