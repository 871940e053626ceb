// Raw per-node samples as stored by the filesystem collectors

use serde::{Deserialize, Serialize};

/// Node id of the filesystem-wide rollup row. Never attributed to a node or job.
pub const AGGREGATE_NODE: &str = "aggr";

/// Storage tag for metadata-server rows.
pub const KIND_METADATA: &str = "mdt";
/// Storage tag for object-storage (IO) rows.
pub const KIND_IO: &str = "ost";

/// Counters carried by one sample row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SampleKind {
    /// Metadata operation count.
    Metadata { ops: u64 },
    /// Write IOPS, write bytes, read IOPS, read bytes.
    Io {
        write_iops: u64,
        write_bytes: u64,
        read_iops: u64,
        read_bytes: u64,
    },
}

impl SampleKind {
    /// Storage tag of this kind ("mdt" / "ost").
    pub fn tag(&self) -> &'static str {
        match self {
            SampleKind::Metadata { .. } => KIND_METADATA,
            SampleKind::Io { .. } => KIND_IO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Seconds, quantized to the collector snap interval.
    pub timestamp: i64,
    pub node_id: String,
    /// Seconds covered by the counters of this sample.
    pub interval_seconds: i64,
    pub kind: SampleKind,
}

impl Sample {
    pub fn is_aggregate(&self) -> bool {
        self.node_id == AGGREGATE_NODE
    }
}
