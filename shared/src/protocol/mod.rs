pub mod built_in;
pub mod datagram;
pub mod envelope;
pub mod header;
pub mod payloads;
pub mod qos;
