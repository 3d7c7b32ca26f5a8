pub mod base_link;
pub mod chunk_buffer;
pub mod error;
pub mod latency;
pub mod link_config;
pub mod receiver;
pub mod reorder_buffer;
pub mod unacked;
