// Job-node mapping: who owns which node at a given instant, and which running jobs to sum.

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::models::{JobRecord, JobStats, NodeStats};
use crate::skip::SkipFilter;
use crate::store::JobRegistry;
use tracing::{debug, instrument};

/// Attributes active nodes to the jobs in `records`.
///
/// Every node in `nodes` ends up in exactly one output job; nodes no record claims become a
/// pseudo-job keyed by the node id. Only jobs with at least one active node are returned.
/// Overlapping node lists are not corrected: the record iterated last claims the node.
pub fn attribute_nodes(
    records: &[JobRecord],
    nodes: &BTreeMap<String, NodeStats>,
) -> HashMap<String, JobStats> {
    let mut jobs: HashMap<String, JobStats> = HashMap::new();
    let mut node_to_job: HashMap<&str, &str> = HashMap::new();
    for r in records {
        if jobs.contains_key(&r.job_id) {
            continue;
        }
        jobs.insert(r.job_id.clone(), JobStats::from_record(r));
        for nid in &r.node_list {
            node_to_job.insert(nid.as_str(), r.job_id.as_str());
        }
    }

    let mut active: HashMap<String, JobStats> = HashMap::new();
    let mut orphans = 0usize;
    for (node_id, stats) in nodes {
        let job = match node_to_job.get(node_id.as_str()) {
            Some(&job_id) => active.entry(job_id.to_string()).or_insert_with(|| {
                jobs.remove(job_id)
                    .unwrap_or_else(|| JobStats::pseudo(job_id))
            }),
            None => {
                orphans += 1;
                active
                    .entry(node_id.clone())
                    .or_insert_with(|| JobStats::pseudo(node_id))
            }
        };
        job.add_node(stats);
    }
    if orphans > 0 {
        debug!(orphans, "active nodes without a running job");
    }
    active
}

/// Snapshot mapping: running jobs (all clusters) started before `timestamp`, restricted to
/// those with activity in `nodes`.
#[instrument(skip(registry, nodes), fields(nodes_count = nodes.len()))]
pub async fn map_nodes_to_jobs<R: JobRegistry>(
    registry: &R,
    timestamp: i64,
    nodes: &BTreeMap<String, NodeStats>,
) -> Result<HashMap<String, JobStats>> {
    let records = registry.find_running_jobs_started_before(timestamp).await?;
    Ok(attribute_nodes(&records, nodes))
}

/// Running jobs of `filesystem`, seeded from their cached totals and watermark.
#[instrument(skip(registry, skip))]
pub async fn get_running_jobs<R: JobRegistry>(
    registry: &R,
    filesystem: &str,
    skip: &SkipFilter,
) -> Result<HashMap<String, JobStats>> {
    let records = registry.find_running_jobs().await?;
    let total = records.len();
    let mut jobs: HashMap<String, JobStats> = HashMap::new();
    for r in &records {
        if !skip.admits(filesystem, &r.job_id) {
            continue;
        }
        jobs.entry(r.job_id.clone())
            .or_insert_with(|| JobStats::from_cached_record(r));
    }
    debug!(total, kept = jobs.len(), "running jobs");
    Ok(jobs)
}
