//! # Radome Shared
//! Reliability engine, wire protocol and topology contracts shared between
//! radome-server & radome-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod backends;
mod link;
mod link_registry;
mod manager;
mod player_ids;
mod protocol;
mod scheduler;
mod sequence;
mod serde;
mod transport;
mod types;

pub use backends::Timestamp;
pub use link::{
    base_link::Link, chunk_buffer::ChunkBuffer, error::LinkError, latency::LatencyRing,
    link_config::LinkConfig, receiver::Receiver, reorder_buffer::{Parked, ReorderBuffer},
    unacked::UnackedList,
};
pub use link_registry::{LinkHandle, LinkRegistry, RegistryError};
pub use manager::{
    error::SendError,
    events::{
        DisconnectPlayerEvent, Events, NetworkEvent, PacketEvent, ReceivedPacket,
        ReconnectPlayerEvent, RegisterPlayerEvent, UnregisterPlayerEvent,
    },
    network_manager::{check_kind, NetworkManager},
    network_state::NetworkState,
    packet_manager::PacketManager,
};
pub use player_ids::{PlayerIdError, PlayerIdSet};
pub use protocol::{
    built_in::BuiltInPacket,
    datagram::{
        encode_latency_probe, encode_single, write_chunk, ChunkIter, Datagram, CHUNK_LENGTH_SIZE,
    },
    envelope::Envelope,
    header::QosHeader,
    payloads::{from_body, to_body, PlayerNotice, RegisterPlayer, StopNetwork},
    qos::{Qos, QosType},
};
pub use scheduler::{JobHandle, Scheduler};
pub use sequence::{is_resend_age, wrapping_diff, SeqNum};
pub use serde::{read_bytes, Serde, SerdeErr};
pub use transport::{
    error::TransportError, Connection, ConnectionState, Connector, Listener, TransportEvent,
};
pub use types::{PlayerId, BROADCAST_PLAYER_ID, HUB_PLAYER_ID};
