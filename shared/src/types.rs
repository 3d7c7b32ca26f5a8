/// Identifies a player in the session. The hub always holds id 0.
pub type PlayerId = u16;

/// The player id owned by the hub (the session leader).
pub const HUB_PLAYER_ID: PlayerId = 0;

/// Target id meaning "every player except the sender".
pub const BROADCAST_PLAYER_ID: PlayerId = u16::MAX;
