//! # Radome Client
//! A spoke of a radome session. Connects to the hub, joins the session and
//! exchanges packets with every other player through the hub's relay.

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

mod spoke;

pub use radome_shared::{
    Events, NetworkEvent, NetworkManager, NetworkState, PacketEvent, ReceivedPacket,
    RegisterPlayerEvent, UnregisterPlayerEvent,
};
pub use spoke::{error::SpokeError, spoke::Spoke, spoke_config::SpokeConfig};
