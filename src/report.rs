// Rate and lifetime-total views over JobStats, ranking, and the text tables printed by the CLI.

use std::fmt::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::models::{IoCounters, JobStats};

/// Ranking metric, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Metadata operations.
    Meta,
    /// Read + write IOPS.
    Iops,
    /// Read + write bandwidth.
    Bw,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meta" => Ok(SortKey::Meta),
            "iops" => Ok(SortKey::Iops),
            "bw" => Ok(SortKey::Bw),
            other => Err(Error::InvalidSortKey(other.to_string())),
        }
    }
}

impl SortKey {
    pub fn metric(&self, c: &IoCounters) -> u64 {
        match self {
            SortKey::Meta => c.miops,
            SortKey::Iops => c.iops(),
            SortKey::Bw => c.bandwidth(),
        }
    }
}

/// Jobs sorted by `key`, largest first; ties broken by job id for stable output.
pub fn rank<I>(jobs: I, key: SortKey) -> Vec<JobStats>
where
    I: IntoIterator<Item = JobStats>,
{
    let mut v: Vec<JobStats> = jobs.into_iter().collect();
    v.sort_by(|a, b| {
        key.metric(&b.counters)
            .cmp(&key.metric(&a.counters))
            .then_with(|| a.job_id.cmp(&b.job_id))
    });
    v
}

/// Per-second rates of one job at one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRates {
    pub job_id: String,
    pub owner: String,
    pub nodes: usize,
    pub miops: f64,
    pub wiops: f64,
    /// Bytes per second.
    pub wbw: f64,
    pub riops: f64,
    /// Bytes per second.
    pub rbw: f64,
}

impl JobRates {
    /// Divides the snapshot counters by the sampling interval (not wall-clock time).
    pub fn from_stats(job: &JobStats) -> Self {
        let dt = if job.dt > 0 { job.dt as f64 } else { 1.0 };
        let c = &job.counters;
        Self {
            job_id: job.job_id.clone(),
            owner: job.owner.clone(),
            nodes: job.node_list.len(),
            miops: c.miops as f64 / dt,
            wiops: c.wiops as f64 / dt,
            wbw: c.wbw as f64 / dt,
            riops: c.riops as f64 / dt,
            rbw: c.rbw as f64 / dt,
        }
    }
}

/// Lifetime totals of one job plus its elapsed runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTotals {
    pub job_id: String,
    pub owner: String,
    pub nodes: usize,
    pub runtime_secs: i64,
    pub counters: IoCounters,
    pub watermark: Option<i64>,
}

impl JobTotals {
    pub fn from_stats(job: &JobStats, now: i64) -> Self {
        Self {
            job_id: job.job_id.clone(),
            owner: job.owner.clone(),
            nodes: job.node_list.len(),
            runtime_secs: runtime_secs(job, now),
            counters: job.counters,
            watermark: job.watermark,
        }
    }
}

/// `now - start` for running jobs, `end - start` otherwise.
pub fn runtime_secs(job: &JobStats, now: i64) -> i64 {
    let until = if job.is_running() { now } else { job.end };
    (until - job.start).max(0)
}

/// The six filesystem totals tracked as maxima: nodes, meta/s, write IOPS/s, read IOPS/s,
/// write B/s, read B/s.
pub fn rate_totals(rates: &[JobRates]) -> [u64; 6] {
    let mut t = [0f64; 6];
    for r in rates {
        t[0] += r.nodes as f64;
        t[1] += r.miops;
        t[2] += r.wiops;
        t[3] += r.riops;
        t[4] += r.wbw;
        t[5] += r.rbw;
    }
    t.map(|v| v as u64)
}

/// Display id: cluster suffix dropped.
fn short_id(job_id: &str) -> &str {
    job_id.split('.').next().unwrap_or(job_id)
}

/// Scales a byte rate to B/s, KB/s, MB/s or GB/s (factor 1000).
pub fn normalize_bw(bytes_per_sec: f64) -> (f64, &'static str) {
    scale(bytes_per_sec, &["B/s", "KB/s", "MB/s", "GB/s"])
}

/// Scales a byte count to B, KB, MB or GB (factor 1000).
pub fn normalize_size(bytes: f64) -> String {
    let (v, unit) = scale(bytes, &["B", "KB", "MB", "GB"]);
    format!("{:.2} {}", v, unit)
}

fn scale(mut v: f64, units: &[&'static str]) -> (f64, &'static str) {
    let mut i = 0;
    while v > 1000.0 && i + 1 < units.len() {
        v /= 1000.0;
        i += 1;
    }
    (v, units[i])
}

pub fn render_top_table(rates: &[JobRates]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "JOBID      OWNER    NODES  META   WRITE      WrBW   READ      ReBW"
    );
    let _ = writeln!(
        out,
        "                           IOPS    IOPS      MB/s   IOPS      MB/s"
    );
    let _ = writeln!(out, "{}", "=".repeat(66));
    for r in rates {
        let _ = writeln!(
            out,
            "{:<10} {:<8} {:<5} {:>6} {:>6} {:>9.2} {:>6} {:>9.2}",
            short_id(&r.job_id),
            r.owner,
            r.nodes,
            r.miops as u64,
            r.wiops as u64,
            r.wbw / 1e6,
            r.riops as u64,
            r.rbw / 1e6,
        );
    }
    out
}

pub fn render_sum_table(totals: &[JobTotals]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "JOBID      OWNER    NODES TIME   META  WRITE      WrBW   READ      ReBW"
    );
    let _ = writeln!(
        out,
        "                          [H]   KIOPS  KIOPS      [GB]   KIOPS     [GB]"
    );
    let _ = writeln!(out, "{}", "=".repeat(71));
    for t in totals {
        let c = &t.counters;
        let _ = writeln!(
            out,
            "{:<10} {:<8} {:<5} {:>4.1} {:>6} {:>6} {:>9.2} {:>6} {:>9.2}",
            short_id(&t.job_id),
            t.owner,
            t.nodes,
            t.runtime_secs as f64 / 3600.0,
            c.miops / 1000,
            c.wiops / 1000,
            c.wbw as f64 / 1e9,
            c.riops / 1000,
            c.rbw as f64 / 1e9,
        );
    }
    out
}
