use std::default::Default;

use radome_shared::{LinkConfig, Scheduler};

/// Contains Config properties which will be used by a Spoke
#[derive(Clone, Debug, Default)]
pub struct SpokeConfig {
    /// Used to configure the link to the hub
    pub link: LinkConfig,
    /// Where the link's receive job runs
    pub scheduler: Scheduler,
}
