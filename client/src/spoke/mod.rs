pub mod error;
pub mod spoke;
pub mod spoke_config;
