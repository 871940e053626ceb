use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Collector-owned samples; opened read-only and never created.
    pub sample_store: StoreConfig,
    /// Scheduler-owned job records; must exist, only cache columns are written.
    pub job_registry: StoreConfig,
    /// Per-filesystem maxima; created on first use.
    pub maxima_store: StoreConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub skip: SkipConfig,
}

/// Connection settings for one SQLite-backed store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Client-side timeout; a slow or locked store surfaces as an error after this.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_busy_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Collector snap interval; sample timestamps are multiples of this.
    #[serde(default = "default_snap_secs")]
    pub snap_secs: i64,
    /// How far back to search for the latest snapshot.
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: i64,
}

fn default_snap_secs() -> i64 {
    5
}

fn default_lookback_secs() -> i64 {
    300
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            snap_secs: default_snap_secs(),
            lookback_secs: default_lookback_secs(),
        }
    }
}

/// Filesystem name -> substring its job ids contain (batch server name).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkipConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub batch_servers: HashMap<String, String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (name, store) in [
            ("sample_store", &self.sample_store),
            ("job_registry", &self.job_registry),
            ("maxima_store", &self.maxima_store),
        ] {
            anyhow::ensure!(!store.path.is_empty(), "{}.path must be non-empty", name);
            anyhow::ensure!(
                store.max_pool_size > 0,
                "{}.max_pool_size must be > 0, got {}",
                name,
                store.max_pool_size
            );
            anyhow::ensure!(
                store.busy_timeout_secs > 0,
                "{}.busy_timeout_secs must be > 0, got {}",
                name,
                store.busy_timeout_secs
            );
        }
        anyhow::ensure!(
            self.sampling.snap_secs > 0,
            "sampling.snap_secs must be > 0, got {}",
            self.sampling.snap_secs
        );
        anyhow::ensure!(
            self.sampling.lookback_secs > 0,
            "sampling.lookback_secs must be > 0, got {}",
            self.sampling.lookback_secs
        );
        for (fs, substring) in &self.skip.batch_servers {
            anyhow::ensure!(
                !substring.is_empty(),
                "skip.batch_servers.{} must be non-empty",
                fs
            );
        }
        Ok(())
    }
}
