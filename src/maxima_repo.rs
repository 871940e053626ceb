// Per-filesystem display maxima. This is the one store jobio owns: created on first use,
// one row per filesystem.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::FilesystemMaxima;
use crate::pool::{Access, open_pool};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub struct MaximaRepo {
    pool: SqlitePool,
}

impl MaximaRepo {
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = open_pool(config, Access::Owned).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fsmaxima (
                fsname TEXT PRIMARY KEY,
                nodes INTEGER NOT NULL,
                meta INTEGER NOT NULL,
                wiops INTEGER NOT NULL,
                riops INTEGER NOT NULL,
                wbw INTEGER NOT NULL,
                rbw INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stored maxima for `filesystem`, all zero if none were written yet.
    #[instrument(skip(self), fields(repo = "maxima", operation = "read_maxima"))]
    pub async fn read_maxima(&self, filesystem: &str) -> Result<FilesystemMaxima> {
        let row = sqlx::query(
            "SELECT nodes, meta, wiops, riops, wbw, rbw FROM fsmaxima WHERE fsname = $1",
        )
        .bind(filesystem)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(FilesystemMaxima::default());
        };
        let mut values = [0u64; 6];
        for (i, v) in values.iter_mut().enumerate() {
            let stored: i64 = row.try_get(i)?;
            *v = stored.max(0) as u64;
        }
        Ok(FilesystemMaxima::new(values))
    }

    /// Upserts all six values. Peaks beyond the integer column are stored as `i64::MAX`.
    #[instrument(skip(self, maxima), fields(repo = "maxima", operation = "write_maxima"))]
    pub async fn write_maxima(&self, filesystem: &str, maxima: &FilesystemMaxima) -> Result<()> {
        let v = maxima.values.map(|x| i64::try_from(x).unwrap_or(i64::MAX));
        sqlx::query(
            r#"
            INSERT INTO fsmaxima (fsname, nodes, meta, wiops, riops, wbw, rbw)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(fsname) DO UPDATE SET
                nodes = excluded.nodes, meta = excluded.meta,
                wiops = excluded.wiops, riops = excluded.riops,
                wbw = excluded.wbw, rbw = excluded.rbw
            "#,
        )
        .bind(filesystem)
        .bind(v[0])
        .bind(v[1])
        .bind(v[2])
        .bind(v[3])
        .bind(v[4])
        .bind(v[5])
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
