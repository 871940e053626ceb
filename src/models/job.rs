// Job registry records and the in-memory per-job aggregate

use serde::{Deserialize, Serialize};

use super::{IoCounters, NodeStats};

/// `end` value of a job that is still running.
pub const RUNNING: i64 = -1;

/// Lifetime totals already summed up to `watermark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheFields {
    pub watermark: i64,
    pub totals: IoCounters,
}

/// One job as stored in the registry. Only `cache` is ever written by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Cluster-qualified id, e.g. "659096.intern2-2015".
    pub job_id: String,
    pub node_list: Vec<String>,
    pub start: i64,
    pub end: i64,
    pub owner: String,
    pub cmd: String,
    pub cache: Option<CacheFields>,
}

impl JobRecord {
    pub fn is_running(&self) -> bool {
        self.end == RUNNING
    }
}

/// Per-job aggregate built fresh on every call; never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub job_id: String,
    pub counters: IoCounters,
    pub node_list: Vec<String>,
    pub start: i64,
    pub end: i64,
    pub owner: String,
    pub cmd: String,
    /// Sampling interval for rate conversion.
    pub dt: i64,
    /// Cache watermark as read from the registry; `None` when nothing was cached yet.
    pub watermark: Option<i64>,
}

impl JobStats {
    /// Zeroed stats carrying the descriptive fields of `record`.
    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            job_id: record.job_id.clone(),
            counters: IoCounters::default(),
            node_list: record.node_list.clone(),
            start: record.start,
            end: record.end,
            owner: record.owner.clone(),
            cmd: record.cmd.clone(),
            dt: 1,
            watermark: None,
        }
    }

    /// Stats seeded from the record's cache, for cumulative accumulation.
    pub fn from_cached_record(record: &JobRecord) -> Self {
        let mut stats = Self::from_record(record);
        if let Some(cache) = record.cache {
            stats.counters = cache.totals;
            stats.watermark = Some(cache.watermark);
        }
        stats
    }

    /// One-node job standing in for an active node no running job claims.
    pub fn pseudo(node_id: &str) -> Self {
        Self {
            job_id: node_id.to_string(),
            counters: IoCounters::default(),
            node_list: vec![node_id.to_string()],
            start: 0,
            end: RUNNING,
            owner: String::new(),
            cmd: String::new(),
            dt: 1,
            watermark: None,
        }
    }

    pub fn add_node(&mut self, node: &NodeStats) {
        self.counters.add(&node.counters);
        self.dt = node.dt;
    }

    pub fn is_running(&self) -> bool {
        self.end == RUNNING
    }

    /// Where the next accumulation window starts.
    pub fn window_start(&self) -> i64 {
        self.watermark.unwrap_or(self.start)
    }

    /// A closed job whose cache already reaches its end; nothing left to sum.
    pub fn is_drained(&self) -> bool {
        !self.is_running() && self.watermark == Some(self.end)
    }
}
