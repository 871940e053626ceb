// One invocation = one synchronous pass: query, fold, optionally write back, hand rows to the
// caller for printing. Any store failure aborts the pass; there are no partial reports.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::accumulator;
use crate::aggregator;
use crate::config::AppConfig;
use crate::error::Result;
use crate::job_repo::JobRepo;
use crate::mapper;
use crate::maxima_repo::MaximaRepo;
use crate::models::{FilesystemMaxima, IoCounters, Sample};
use crate::report::{self, JobRates, JobTotals, SortKey};
use crate::sample_repo::SampleRepo;
use crate::skip::SkipFilter;
use crate::store::SampleStore;

/// The store adapters of one invocation. The sample store and job registry must already
/// exist; only the maxima store is created (and its table initialized) here.
pub struct Stores {
    pub samples: SampleRepo,
    pub jobs: JobRepo,
    pub maxima: MaximaRepo,
}

impl Stores {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let samples = SampleRepo::connect(&config.sample_store).await?;
        let jobs = JobRepo::connect(&config.job_registry).await?;
        let maxima = MaximaRepo::connect(&config.maxima_store).await?;
        maxima.init().await?;
        Ok(Self {
            samples,
            jobs,
            maxima,
        })
    }
}

/// Current per-second rates of the jobs active at the latest snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopReport {
    pub filesystem: String,
    pub timestamp: i64,
    pub jobs: Vec<JobRates>,
    /// Nodes, meta/s, write IOPS/s, read IOPS/s, write B/s, read B/s.
    pub totals: [u64; 6],
    pub maxima: FilesystemMaxima,
}

/// Lifetime totals of the filesystem's running jobs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SumReport {
    pub filesystem: String,
    pub now: i64,
    pub jobs: Vec<JobTotals>,
}

/// Aggregate-row totals of one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub timestamp: i64,
    pub counters: IoCounters,
}

pub async fn top(
    stores: &Stores,
    config: &AppConfig,
    filesystem: &str,
    key: SortKey,
    now: i64,
) -> Result<TopReport> {
    let (timestamp, nodes) =
        aggregator::current_node_stats(&stores.samples, filesystem, &config.sampling, now).await?;
    let jobs = mapper::map_nodes_to_jobs(&stores.jobs, timestamp, &nodes).await?;
    let rates: Vec<JobRates> = report::rank(jobs.into_values(), key)
        .iter()
        .map(JobRates::from_stats)
        .collect();
    let totals = report::rate_totals(&rates);
    let maxima = track_maxima(&stores.maxima, filesystem, &totals).await?;
    info!(
        filesystem,
        timestamp,
        nodes = nodes.len(),
        jobs = rates.len(),
        "top"
    );
    Ok(TopReport {
        filesystem: filesystem.to_string(),
        timestamp,
        jobs: rates,
        totals,
        maxima,
    })
}

pub async fn sum(
    stores: &Stores,
    config: &AppConfig,
    filesystem: &str,
    key: SortKey,
    now: i64,
) -> Result<SumReport> {
    let skip = SkipFilter::from_config(&config.skip);
    let running = mapper::get_running_jobs(&stores.jobs, filesystem, &skip).await?;
    let jobs = accumulator::accumulate(
        &stores.samples,
        &stores.jobs,
        filesystem,
        running,
        &skip,
        now,
    )
    .await?;
    let totals = report::rank(jobs.into_values(), key)
        .iter()
        .map(|j| JobTotals::from_stats(j, now))
        .collect();
    Ok(SumReport {
        filesystem: filesystem.to_string(),
        now,
        jobs: totals,
    })
}

/// Read-or-zero maxima, raised by `totals`; written back only if something increased.
pub async fn track_maxima(
    repo: &MaximaRepo,
    filesystem: &str,
    totals: &[u64; 6],
) -> Result<FilesystemMaxima> {
    let mut maxima = repo.read_maxima(filesystem).await?;
    if maxima.observe(totals) {
        debug!(filesystem, maxima = ?maxima.values, "new filesystem maxima");
        repo.write_maxima(filesystem, &maxima).await?;
    }
    Ok(maxima)
}

/// Merges aggregate-row samples per timestamp (metadata and IO rows add up).
pub fn fold_timeline(samples: &[Sample]) -> Vec<TimelinePoint> {
    let mut by_ts: BTreeMap<i64, IoCounters> = BTreeMap::new();
    for s in samples.iter().filter(|s| s.is_aggregate()) {
        by_ts.entry(s.timestamp).or_default().add_kind(&s.kind);
    }
    by_ts
        .into_iter()
        .map(|(timestamp, counters)| TimelinePoint {
            timestamp,
            counters,
        })
        .collect()
}

/// Filesystem-wide totals per timestamp over `(start, end)`.
pub async fn timeline<S: SampleStore>(
    samples: &S,
    filesystem: &str,
    start: i64,
    end: i64,
) -> Result<Vec<TimelinePoint>> {
    let rows = samples
        .aggregate_samples_in_range(filesystem, start, end)
        .await?;
    Ok(fold_timeline(&rows))
}
