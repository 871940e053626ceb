// Naming-convention filter: job ids carry their batch server name, and each filesystem is
// served by one batch server, so jobs of other clusters can be dropped before summing.
// Purely an optimization; a disabled filter gives the same totals, only slower.

use std::collections::HashMap;

use crate::config::SkipConfig;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    enabled: bool,
    batch_servers: HashMap<String, String>,
}

impl SkipFilter {
    pub fn new(enabled: bool, batch_servers: HashMap<String, String>) -> Self {
        Self {
            enabled,
            batch_servers,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SkipConfig) -> Self {
        Self::new(config.enabled, config.batch_servers.clone())
    }

    /// Whether `job_id` should be processed for `filesystem`.
    /// A filesystem without a configured substring admits every job.
    pub fn admits(&self, filesystem: &str, job_id: &str) -> bool {
        if !self.enabled {
            return true;
        }
        match self.batch_servers.get(filesystem) {
            Some(substring) => job_id.contains(substring.as_str()),
            None => {
                debug!(filesystem, "no batch server mapped; skip filter admits all jobs");
                true
            }
        }
    }
}
