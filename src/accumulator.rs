// Cumulative accumulation: extend each job's cached lifetime totals from its watermark to now
// (or job end), then persist watermark + totals with a conditional update.
//
// The window is (watermark, window_end]. Ranges below the watermark are never summed again,
// and a write only lands if nobody advanced the watermark since it was read.

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{IoCounters, JobStats, Sample};
use crate::skip::SkipFilter;
use crate::store::{CacheUpdate, JobRegistry, SampleStore};
use tracing::{debug, info, instrument};

/// What happened to one job during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Closed job whose cache already covers it; no query issued.
    Drained,
    /// Window was empty (watermark already at the window end); no query issued.
    UpToDate,
    /// Window summed and the new cache persisted.
    Advanced,
    /// Another accumulator moved the watermark first; this pass's delta was dropped.
    Conflict,
}

/// Counts of each outcome in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub drained: usize,
    pub up_to_date: usize,
    pub advanced: usize,
    pub conflicts: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Drained => self.drained += 1,
            JobOutcome::UpToDate => self.up_to_date += 1,
            JobOutcome::Advanced => self.advanced += 1,
            JobOutcome::Conflict => self.conflicts += 1,
        }
    }
}

/// End of the accumulation window: `now` for running jobs, the job end (never past `now`)
/// otherwise.
pub fn window_end(job: &JobStats, now: i64) -> i64 {
    if job.is_running() {
        now
    } else {
        job.end.min(now)
    }
}

/// Sums node samples of the job's nodes into `totals`. The aggregate row never counts.
fn fold_into(totals: &mut IoCounters, samples: &[Sample]) {
    for s in samples.iter().filter(|s| !s.is_aggregate()) {
        totals.add_kind(&s.kind);
    }
}

/// Advances one job. On return `job` holds the totals and watermark that are now persisted
/// (or, on conflict, what was read before this pass).
pub async fn accumulate_job<S: SampleStore, R: JobRegistry>(
    samples: &S,
    registry: &R,
    filesystem: &str,
    job: &mut JobStats,
    now: i64,
) -> Result<JobOutcome> {
    if job.is_drained() {
        return Ok(JobOutcome::Drained);
    }
    let start = job.window_start();
    let end = window_end(job, now);
    if end <= start {
        return Ok(JobOutcome::UpToDate);
    }

    let rows = samples
        .samples_in_range(filesystem, &job.node_list, start, end)
        .await?;
    let mut totals = job.counters;
    fold_into(&mut totals, &rows);

    match registry
        .cas_update_cache(&job.job_id, job.watermark, end, &totals)
        .await?
    {
        CacheUpdate::Applied => {
            job.counters = totals;
            job.watermark = Some(end);
            Ok(JobOutcome::Advanced)
        }
        CacheUpdate::Conflict => {
            debug!(
                job_id = %job.job_id,
                expected = ?job.watermark,
                "watermark moved by a concurrent accumulator; delta dropped"
            );
            Ok(JobOutcome::Conflict)
        }
    }
}

/// Extends lifetime totals of every job admitted by `skip`. Jobs the filter rejects are not
/// part of the result. Store failures abort the whole pass.
#[instrument(skip(samples, registry, jobs, skip), fields(jobs_count = jobs.len()))]
pub async fn accumulate<S: SampleStore, R: JobRegistry>(
    samples: &S,
    registry: &R,
    filesystem: &str,
    jobs: HashMap<String, JobStats>,
    skip: &SkipFilter,
    now: i64,
) -> Result<HashMap<String, JobStats>> {
    let mut out = HashMap::with_capacity(jobs.len());
    let mut summary = PassSummary::default();
    for (job_id, mut job) in jobs {
        if !skip.admits(filesystem, &job_id) {
            continue;
        }
        let outcome = accumulate_job(samples, registry, filesystem, &mut job, now).await?;
        summary.record(outcome);
        out.insert(job_id, job);
    }
    info!(
        filesystem,
        jobs = out.len(),
        advanced = summary.advanced,
        drained = summary.drained,
        up_to_date = summary.up_to_date,
        conflicts = summary.conflicts,
        "accumulation pass"
    );
    Ok(out)
}
