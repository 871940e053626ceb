// Collaborator seams: the sample store and the job registry.
// SQLite implementations live in sample_repo and job_repo; tests plug in in-memory fakes.

use std::future::Future;

use crate::error::Result;
use crate::models::{IoCounters, JobRecord, Sample};

/// Read-only access to time-stamped per-node samples of one or more filesystems.
pub trait SampleStore {
    /// Newest sample timestamp of `filesystem` strictly after `since`, if any.
    fn latest_timestamp(
        &self,
        filesystem: &str,
        since: i64,
    ) -> impl Future<Output = Result<Option<i64>>> + Send;

    /// Every sample (aggregate row included) stamped exactly `timestamp`.
    fn samples_at(
        &self,
        filesystem: &str,
        timestamp: i64,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send;

    /// Samples of the given nodes with `after < ts <= up_to`, in one query.
    fn samples_in_range(
        &self,
        filesystem: &str,
        nodes: &[String],
        after: i64,
        up_to: i64,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send;

    /// Aggregate-row samples with `start < ts < end`.
    fn aggregate_samples_in_range(
        &self,
        filesystem: &str,
        start: i64,
        end: i64,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send;
}

/// Outcome of a conditional cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    Applied,
    /// The stored watermark no longer matched; someone else advanced the job.
    Conflict,
}

/// Cross-cluster job registry. Not partitioned by filesystem.
pub trait JobRegistry {
    /// Running jobs (`end == -1`) with `start < timestamp`.
    fn find_running_jobs_started_before(
        &self,
        timestamp: i64,
    ) -> impl Future<Output = Result<Vec<JobRecord>>> + Send;

    /// All running jobs (`end == -1`).
    fn find_running_jobs(&self) -> impl Future<Output = Result<Vec<JobRecord>>> + Send;

    /// Sets watermark and totals together iff the stored watermark still equals `expected`
    /// (`None` = no cache stored yet).
    fn cas_update_cache(
        &self,
        job_id: &str,
        expected: Option<i64>,
        watermark: i64,
        totals: &IoCounters,
    ) -> impl Future<Output = Result<CacheUpdate>> + Send;
}
