// NodeStats aggregation: fold one timestamp's samples into one counter set per node.

use std::collections::BTreeMap;

use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use crate::models::{NodeStats, Sample};
use crate::store::SampleStore;
use tracing::{debug, instrument};

/// `now` rounded down to the collector snap interval.
pub fn snap_time(now: i64, snap_secs: i64) -> i64 {
    if snap_secs <= 0 {
        return now;
    }
    now.div_euclid(snap_secs) * snap_secs
}

/// Folds samples into `node -> NodeStats`. The aggregate row is skipped; metadata and IO rows
/// of the same node add up rather than overwrite. `dt` comes from the first sample of a node.
pub fn fold_node_samples(samples: &[Sample]) -> BTreeMap<String, NodeStats> {
    let mut nodes: BTreeMap<String, NodeStats> = BTreeMap::new();
    for s in samples {
        if s.is_aggregate() {
            continue;
        }
        nodes
            .entry(s.node_id.clone())
            .or_insert_with(|| NodeStats::new(s.node_id.clone(), s.interval_seconds))
            .counters
            .add_kind(&s.kind);
    }
    nodes
}

/// Resolves the newest snapshot of `filesystem` within the lookback window.
pub async fn latest_snapshot_time<S: SampleStore>(
    store: &S,
    filesystem: &str,
    sampling: &SamplingConfig,
    now: i64,
) -> Result<i64> {
    let since = snap_time(now, sampling.snap_secs) - sampling.lookback_secs;
    store
        .latest_timestamp(filesystem, since)
        .await?
        .ok_or_else(|| Error::NoRecentSamples {
            filesystem: filesystem.to_string(),
            lookback_secs: sampling.lookback_secs,
        })
}

/// Per-node stats of the samples stamped `timestamp`.
pub async fn node_stats_at<S: SampleStore>(
    store: &S,
    filesystem: &str,
    timestamp: i64,
) -> Result<BTreeMap<String, NodeStats>> {
    let samples = store.samples_at(filesystem, timestamp).await?;
    let nodes = fold_node_samples(&samples);
    debug!(
        samples = samples.len(),
        nodes = nodes.len(),
        timestamp,
        "folded snapshot"
    );
    Ok(nodes)
}

/// Latest snapshot timestamp and the per-node stats of every node active at it.
#[instrument(skip(store, sampling))]
pub async fn current_node_stats<S: SampleStore>(
    store: &S,
    filesystem: &str,
    sampling: &SamplingConfig,
    now: i64,
) -> Result<(i64, BTreeMap<String, NodeStats>)> {
    let timestamp = latest_snapshot_time(store, filesystem, sampling, now).await?;
    let nodes = node_stats_at(store, filesystem, timestamp).await?;
    Ok((timestamp, nodes))
}
