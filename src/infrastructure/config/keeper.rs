//! Keeper scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::inbound::keeper::KeeperSettings;

/// `[keeper]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Seconds between keeper passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Markets checked per expiration batch.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_max_batch() -> usize {
    50
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_batch: default_max_batch(),
        }
    }
}

impl KeeperConfig {
    /// Runtime settings for [`crate::adapter::inbound::keeper::Keeper`].
    #[must_use]
    pub const fn settings(&self) -> KeeperSettings {
        KeeperSettings {
            interval: Duration::from_secs(self.interval_secs),
            max_batch: self.max_batch,
        }
    }
}
