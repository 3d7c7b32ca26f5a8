pub mod error;
pub mod events;
pub mod network_manager;
pub mod network_state;
pub mod packet_manager;
