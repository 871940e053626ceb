// SQLite job registry. Records and schema are owned by the scheduler sync; only the cache
// columns (cachets + the five totals) are written here, and only through a conditional update.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::{CacheFields, IoCounters, JobRecord, RUNNING};
use crate::pool::{Access, open_pool};
use crate::store::{CacheUpdate, JobRegistry};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::instrument;

const JOB_COLUMNS: &str =
    "jobid, nids, start, \"end\", owner, cmd, cachets, miops, wiops, wbw, riops, rbw";

pub struct JobRepo {
    pool: SqlitePool,
}

impl JobRepo {
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = open_pool(config, Access::ReadWrite).await?;
        Ok(Self { pool })
    }

    fn parse_job_row(row: &SqliteRow) -> Result<JobRecord> {
        let nids: String = row.try_get("nids")?;
        let cachets: Option<i64> = row.try_get("cachets")?;
        let cache = match cachets {
            Some(watermark) => Some(CacheFields {
                watermark,
                totals: IoCounters {
                    miops: cached_counter(row, "miops")?,
                    wiops: cached_counter(row, "wiops")?,
                    wbw: cached_counter(row, "wbw")?,
                    riops: cached_counter(row, "riops")?,
                    rbw: cached_counter(row, "rbw")?,
                },
            }),
            None => None,
        };
        Ok(JobRecord {
            job_id: row.try_get("jobid")?,
            node_list: split_node_list(&nids),
            start: row.try_get("start")?,
            end: row.try_get("end")?,
            owner: row.try_get("owner")?,
            cmd: row.try_get("cmd")?,
            cache,
        })
    }
}

fn cached_counter(row: &SqliteRow, column: &str) -> Result<u64> {
    let v: Option<i64> = row.try_get(column)?;
    Ok(v.unwrap_or(0).max(0) as u64)
}

/// "n1,n2,n3" -> ["n1", "n2", "n3"]; blanks are dropped.
pub fn split_node_list(nids: &str) -> Vec<String> {
    nids.split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect()
}

impl JobRegistry for JobRepo {
    #[instrument(
        skip(self),
        fields(repo = "jobs", operation = "find_running_jobs_started_before")
    )]
    async fn find_running_jobs_started_before(
        &self,
        timestamp: i64,
    ) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM jobs WHERE \"end\" = $1 AND start < $2",
            JOB_COLUMNS
        ))
        .bind(RUNNING)
        .bind(timestamp)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::parse_job_row).collect()
    }

    #[instrument(skip(self), fields(repo = "jobs", operation = "find_running_jobs"))]
    async fn find_running_jobs(&self) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM jobs WHERE \"end\" = $1",
            JOB_COLUMNS
        ))
        .bind(RUNNING)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::parse_job_row).collect()
    }

    /// One UPDATE guarded by `cachets IS expected`: watermark and totals land together or not
    /// at all. Totals beyond `i64::MAX` fail with `CounterOverflow` before anything is written.
    #[instrument(skip(self, totals), fields(repo = "jobs", operation = "cas_update_cache"))]
    async fn cas_update_cache(
        &self,
        job_id: &str,
        expected: Option<i64>,
        watermark: i64,
        totals: &IoCounters,
    ) -> Result<CacheUpdate> {
        let column = |counter: &'static str, v: u64| {
            i64::try_from(v).map_err(|_| Error::CounterOverflow {
                job_id: job_id.to_string(),
                counter,
            })
        };
        let miops = column("miops", totals.miops)?;
        let wiops = column("wiops", totals.wiops)?;
        let wbw = column("wbw", totals.wbw)?;
        let riops = column("riops", totals.riops)?;
        let rbw = column("rbw", totals.rbw)?;
        let r = sqlx::query(
            r#"
            UPDATE jobs
            SET cachets = $1, miops = $2, wiops = $3, wbw = $4, riops = $5, rbw = $6
            WHERE jobid = $7 AND cachets IS $8
            "#,
        )
        .bind(watermark)
        .bind(miops)
        .bind(wiops)
        .bind(wbw)
        .bind(riops)
        .bind(rbw)
        .bind(job_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        if r.rows_affected() == 1 {
            Ok(CacheUpdate::Applied)
        } else {
            Ok(CacheUpdate::Conflict)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_node_list_drops_blanks() {
        assert_eq!(split_node_list("n1,n2, n3,,"), vec!["n1", "n2", "n3"]);
        assert!(split_node_list("").is_empty());
    }
}
