pub mod error;
pub mod hub;
pub mod hub_config;
pub mod player_slot;
