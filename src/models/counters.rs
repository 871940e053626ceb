// The five I/O counters and the per-node view built from them

use serde::{Deserialize, Serialize};

use super::SampleKind;

/// Unsigned cumulative sums of metadata ops, write IOPS, write bytes, read IOPS, read bytes.
/// Bytes stay in the store's native unit; scaling happens at display time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoCounters {
    pub miops: u64,
    pub wiops: u64,
    pub wbw: u64,
    pub riops: u64,
    pub rbw: u64,
}

impl IoCounters {
    /// Adds one sample's counters, saturating at `u64::MAX`. Metadata never touches IO fields
    /// and vice versa.
    pub fn add_kind(&mut self, kind: &SampleKind) {
        match *kind {
            SampleKind::Metadata { ops } => {
                self.miops = self.miops.saturating_add(ops);
            }
            SampleKind::Io {
                write_iops,
                write_bytes,
                read_iops,
                read_bytes,
            } => {
                self.wiops = self.wiops.saturating_add(write_iops);
                self.wbw = self.wbw.saturating_add(write_bytes);
                self.riops = self.riops.saturating_add(read_iops);
                self.rbw = self.rbw.saturating_add(read_bytes);
            }
        }
    }

    pub fn add(&mut self, other: &IoCounters) {
        self.miops = self.miops.saturating_add(other.miops);
        self.wiops = self.wiops.saturating_add(other.wiops);
        self.wbw = self.wbw.saturating_add(other.wbw);
        self.riops = self.riops.saturating_add(other.riops);
        self.rbw = self.rbw.saturating_add(other.rbw);
    }

    pub fn iops(&self) -> u64 {
        self.wiops.saturating_add(self.riops)
    }

    pub fn bandwidth(&self) -> u64 {
        self.wbw.saturating_add(self.rbw)
    }

    pub fn is_zero(&self) -> bool {
        *self == IoCounters::default()
    }
}

/// Counters of one node at one timestamp (or over one accumulation window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    pub node_id: String,
    pub counters: IoCounters,
    /// Interval of the first contributing sample.
    pub dt: i64,
}

impl NodeStats {
    pub fn new(node_id: impl Into<String>, dt: i64) -> Self {
        Self {
            node_id: node_id.into(),
            counters: IoCounters::default(),
            dt,
        }
    }
}
