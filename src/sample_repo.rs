// SQLite sample store. Rows are written by the filesystem collectors; the pool is opened
// read-only and the store must already exist.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::{AGGREGATE_NODE, KIND_IO, KIND_METADATA, Sample, SampleKind};
use crate::pool::{Access, open_pool};
use crate::store::SampleStore;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::instrument;

const SAMPLE_COLUMNS: &str = "ts, nid, dt, kind, v0, v1, v2, v3";

pub struct SampleRepo {
    pool: SqlitePool,
}

impl SampleRepo {
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = open_pool(config, Access::ReadOnly).await?;
        Ok(Self { pool })
    }

    fn parse_sample_row(row: &SqliteRow) -> Result<Sample> {
        let node_id: String = row.try_get("nid")?;
        let kind: String = row.try_get("kind")?;
        let v0: i64 = row.try_get("v0")?;
        let kind = match kind.as_str() {
            KIND_METADATA => SampleKind::Metadata {
                ops: counter(v0),
            },
            KIND_IO => SampleKind::Io {
                write_iops: counter(v0),
                write_bytes: counter(row.try_get("v1")?),
                read_iops: counter(row.try_get("v2")?),
                read_bytes: counter(row.try_get("v3")?),
            },
            other => {
                return Err(Error::MalformedSample {
                    node: node_id,
                    reason: format!("unknown kind '{}'", other),
                });
            }
        };
        Ok(Sample {
            timestamp: row.try_get("ts")?,
            node_id,
            interval_seconds: row.try_get("dt")?,
            kind,
        })
    }

    fn parse_sample_rows(rows: &[SqliteRow]) -> Result<Vec<Sample>> {
        rows.iter().map(Self::parse_sample_row).collect()
    }
}

/// Node ids travel as one JSON array, expanded by `json_each`, so a whole job costs a
/// single query.
pub fn node_list_param(nodes: &[String]) -> Result<String> {
    Ok(serde_json::to_string(nodes)?)
}

/// SQLite integers are signed; counters are not.
fn counter(v: i64) -> u64 {
    v.max(0) as u64
}

impl SampleStore for SampleRepo {
    #[instrument(skip(self), fields(repo = "samples", operation = "latest_timestamp"))]
    async fn latest_timestamp(&self, filesystem: &str, since: i64) -> Result<Option<i64>> {
        let ts = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(ts) FROM samples WHERE fs = $1 AND ts > $2",
        )
        .bind(filesystem)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(ts)
    }

    #[instrument(skip(self), fields(repo = "samples", operation = "samples_at"))]
    async fn samples_at(&self, filesystem: &str, timestamp: i64) -> Result<Vec<Sample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM samples WHERE fs = $1 AND ts = $2",
            SAMPLE_COLUMNS
        ))
        .bind(filesystem)
        .bind(timestamp)
        .fetch_all(&self.pool)
        .await?;
        Self::parse_sample_rows(&rows)
    }

    #[instrument(
        skip(self, nodes),
        fields(repo = "samples", operation = "samples_in_range", nodes_count = nodes.len())
    )]
    async fn samples_in_range(
        &self,
        filesystem: &str,
        nodes: &[String],
        after: i64,
        up_to: i64,
    ) -> Result<Vec<Sample>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let node_json = node_list_param(nodes)?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM samples
             WHERE fs = $1 AND ts > $2 AND ts <= $3
               AND nid IN (SELECT value FROM json_each($4))
             ORDER BY ts ASC",
            SAMPLE_COLUMNS
        ))
        .bind(filesystem)
        .bind(after)
        .bind(up_to)
        .bind(node_json)
        .fetch_all(&self.pool)
        .await?;
        Self::parse_sample_rows(&rows)
    }

    #[instrument(
        skip(self),
        fields(repo = "samples", operation = "aggregate_samples_in_range")
    )]
    async fn aggregate_samples_in_range(
        &self,
        filesystem: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Sample>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM samples
             WHERE fs = $1 AND ts > $2 AND ts < $3 AND nid = $4
             ORDER BY ts ASC",
            SAMPLE_COLUMNS
        ))
        .bind(filesystem)
        .bind(start)
        .bind(end)
        .bind(AGGREGATE_NODE)
        .fetch_all(&self.pool)
        .await?;
        Self::parse_sample_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_list_param_is_a_json_array_of_all_nodes() {
        let nodes = vec!["n1".to_string(), "odd\"node,x".to_string()];
        let param = node_list_param(&nodes).unwrap();
        let back: Vec<String> = serde_json::from_str(&param).unwrap();
        assert_eq!(back, nodes);
    }

    #[test]
    fn encoding_failures_are_errors() {
        let bad = serde_json::from_str::<Vec<String>>("[").unwrap_err();
        assert!(matches!(Error::from(bad), Error::Encoding(_)));
    }
}
