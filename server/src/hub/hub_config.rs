use std::{default::Default, time::Duration};

use radome_shared::{LinkConfig, Scheduler};

/// Contains Config properties which will be used by the Hub
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Used to configure the link to every spoke
    pub link: LinkConfig,
    /// How long a disconnected player's slot is held for a reconnect before
    /// the player is unregistered
    pub registration_timeout: Duration,
    /// Where per-link receive jobs run
    pub scheduler: Scheduler,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            registration_timeout: Duration::from_secs(60),
            scheduler: Scheduler::default(),
        }
    }
}
