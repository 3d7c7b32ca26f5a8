//! # Radome Server
//! The hub of a radome session. Accepts spokes, assigns player ids, relays
//! packets between spokes and holds player slots open across transient
//! disconnects.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use radome_shared::{
        BuiltInPacket, Envelope, LinkConfig, PlayerId, Qos, Scheduler, SeqNum, BROADCAST_PLAYER_ID,
        HUB_PLAYER_ID,
    };
}

mod hub;

pub use hub::{
    error::HubError, hub::Hub, hub_config::HubConfig, player_slot::PlayerSlot,
};
pub use radome_shared::{
    DisconnectPlayerEvent, Events, NetworkEvent, NetworkManager, NetworkState, PacketEvent,
    ReceivedPacket, ReconnectPlayerEvent, RegisterPlayerEvent, UnregisterPlayerEvent,
};
