// Shared test helpers: SQLite fixtures and in-memory stores that count queries

#![allow(dead_code)]

use jobio::config::AppConfig;
use jobio::error::Result;
use jobio::models::*;
use jobio::store::{CacheUpdate, JobRegistry, SampleStore};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn config_for(dir: &Path) -> AppConfig {
    let s = format!(
        r#"
[sample_store]
path = "{}"
max_pool_size = 2

[job_registry]
path = "{}"
max_pool_size = 2

[maxima_store]
path = "{}"
max_pool_size = 1

[skip]
enabled = true

[skip.batch_servers]
alnec = "intern3"
nobnec = "intern2"
"#,
        dir.join("samples.db").display(),
        dir.join("jobs.db").display(),
        dir.join("state/maxima.db").display()
    );
    AppConfig::load_from_str(&s).unwrap()
}

/// Creates a store file and returns a writer pool on it, standing in for the external
/// writers (collectors, scheduler sync).
async fn create_store(path: &str, schema: &[&str]) -> SqlitePool {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await.unwrap();
    for ddl in schema {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    pool
}

/// The collectors' samples table.
pub async fn create_sample_store(path: &str) -> SqlitePool {
    create_store(
        path,
        &[
            r#"
            CREATE TABLE samples (
                fs TEXT NOT NULL,
                ts INTEGER NOT NULL,
                nid TEXT NOT NULL,
                dt INTEGER NOT NULL,
                kind TEXT NOT NULL,
                v0 INTEGER NOT NULL DEFAULT 0,
                v1 INTEGER NOT NULL DEFAULT 0,
                v2 INTEGER NOT NULL DEFAULT 0,
                v3 INTEGER NOT NULL DEFAULT 0
            )
            "#,
            "CREATE INDEX idx_samples_fs_ts_nid ON samples(fs, ts, nid)",
        ],
    )
    .await
}

/// The scheduler sync's jobs table, cache columns nullable.
pub async fn create_job_registry(path: &str) -> SqlitePool {
    create_store(
        path,
        &[r#"
            CREATE TABLE jobs (
                jobid TEXT PRIMARY KEY,
                nids TEXT NOT NULL,
                start INTEGER NOT NULL,
                "end" INTEGER NOT NULL,
                owner TEXT NOT NULL DEFAULT '',
                cmd TEXT NOT NULL DEFAULT '',
                cachets INTEGER,
                miops INTEGER,
                wiops INTEGER,
                wbw INTEGER,
                riops INTEGER,
                rbw INTEGER
            )
            "#],
    )
    .await
}

pub fn meta(ts: i64, node: &str, ops: u64) -> Sample {
    Sample {
        timestamp: ts,
        node_id: node.into(),
        interval_seconds: 5,
        kind: SampleKind::Metadata { ops },
    }
}

pub fn io(ts: i64, node: &str, v: [u64; 4]) -> Sample {
    Sample {
        timestamp: ts,
        node_id: node.into(),
        interval_seconds: 5,
        kind: SampleKind::Io {
            write_iops: v[0],
            write_bytes: v[1],
            read_iops: v[2],
            read_bytes: v[3],
        },
    }
}

pub fn job(job_id: &str, nodes: &[&str], start: i64, end: i64) -> JobRecord {
    JobRecord {
        job_id: job_id.into(),
        node_list: nodes.iter().map(|n| n.to_string()).collect(),
        start,
        end,
        owner: "ppb742".into(),
        cmd: "a.out".into(),
        cache: None,
    }
}

pub async fn insert_samples(pool: &SqlitePool, fs: &str, samples: &[Sample]) {
    for s in samples {
        let v = match s.kind {
            SampleKind::Metadata { ops } => [ops, 0, 0, 0],
            SampleKind::Io {
                write_iops,
                write_bytes,
                read_iops,
                read_bytes,
            } => [write_iops, write_bytes, read_iops, read_bytes],
        };
        sqlx::query(
            "INSERT INTO samples (fs, ts, nid, dt, kind, v0, v1, v2, v3) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(fs)
        .bind(s.timestamp)
        .bind(&s.node_id)
        .bind(s.interval_seconds)
        .bind(s.kind.tag())
        .bind(v[0] as i64)
        .bind(v[1] as i64)
        .bind(v[2] as i64)
        .bind(v[3] as i64)
        .execute(pool)
        .await
        .unwrap();
    }
}

pub async fn insert_job(pool: &SqlitePool, j: &JobRecord) {
    sqlx::query(
        "INSERT INTO jobs (jobid, nids, start, \"end\", owner, cmd) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&j.job_id)
    .bind(j.node_list.join(","))
    .bind(j.start)
    .bind(j.end)
    .bind(&j.owner)
    .bind(&j.cmd)
    .execute(pool)
    .await
    .unwrap();
}

/// In-memory sample store; every query bumps `queries`.
#[derive(Default)]
pub struct MemSamples {
    pub rows: Mutex<Vec<(String, Sample)>>,
    pub queries: AtomicUsize,
}

impl MemSamples {
    pub fn with(fs: &str, samples: Vec<Sample>) -> Self {
        let m = Self::default();
        m.push(fs, samples);
        m
    }

    pub fn push(&self, fs: &str, samples: Vec<Sample>) {
        let mut rows = self.rows.lock().unwrap();
        rows.extend(samples.into_iter().map(|s| (fs.to_string(), s)));
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn select(&self, pred: impl Fn(&str, &Sample) -> bool) -> Vec<Sample> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(fs, s)| pred(fs, s))
            .map(|(_, s)| s.clone())
            .collect()
    }
}

impl SampleStore for MemSamples {
    async fn latest_timestamp(&self, filesystem: &str, since: i64) -> Result<Option<i64>> {
        Ok(self
            .select(|fs, s| fs == filesystem && s.timestamp > since)
            .iter()
            .map(|s| s.timestamp)
            .max())
    }

    async fn samples_at(&self, filesystem: &str, timestamp: i64) -> Result<Vec<Sample>> {
        Ok(self.select(|fs, s| fs == filesystem && s.timestamp == timestamp))
    }

    async fn samples_in_range(
        &self,
        filesystem: &str,
        nodes: &[String],
        after: i64,
        up_to: i64,
    ) -> Result<Vec<Sample>> {
        Ok(self.select(|fs, s| {
            fs == filesystem
                && s.timestamp > after
                && s.timestamp <= up_to
                && nodes.contains(&s.node_id)
        }))
    }

    async fn aggregate_samples_in_range(
        &self,
        filesystem: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Sample>> {
        Ok(self.select(|fs, s| {
            fs == filesystem && s.timestamp > start && s.timestamp < end && s.is_aggregate()
        }))
    }
}

/// In-memory job registry with the same compare-and-set semantics as the SQLite one.
#[derive(Default)]
pub struct MemRegistry {
    pub jobs: Mutex<Vec<JobRecord>>,
    pub cas_calls: AtomicUsize,
}

impl MemRegistry {
    pub fn with(jobs: Vec<JobRecord>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            cas_calls: AtomicUsize::new(0),
        }
    }

    pub fn cache_of(&self, job_id: &str) -> Option<CacheFields> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.job_id == job_id)
            .and_then(|j| j.cache)
    }

    /// Simulates another accumulator advancing the job.
    pub fn force_cache(&self, job_id: &str, cache: CacheFields) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(j) = jobs.iter_mut().find(|j| j.job_id == job_id) {
            j.cache = Some(cache);
        }
    }
}

impl JobRegistry for MemRegistry {
    async fn find_running_jobs_started_before(
        &self,
        timestamp: i64,
    ) -> Result<Vec<JobRecord>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.end == RUNNING && j.start < timestamp)
            .cloned()
            .collect())
    }

    async fn find_running_jobs(&self) -> Result<Vec<JobRecord>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.end == RUNNING)
            .cloned()
            .collect())
    }

    async fn cas_update_cache(
        &self,
        job_id: &str,
        expected: Option<i64>,
        watermark: i64,
        totals: &IoCounters,
    ) -> Result<CacheUpdate> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);
        let mut jobs = self.jobs.lock().unwrap();
        let Some(j) = jobs.iter_mut().find(|j| j.job_id == job_id) else {
            return Ok(CacheUpdate::Conflict);
        };
        if j.cache.map(|c| c.watermark) != expected {
            return Ok(CacheUpdate::Conflict);
        }
        j.cache = Some(CacheFields {
            watermark,
            totals: *totals,
        });
        Ok(CacheUpdate::Applied)
    }
}
