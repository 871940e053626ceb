// SQLite pool setup shared by the store adapters.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How a store file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Existing file owned by someone else; no writes.
    ReadOnly,
    /// Existing file owned by someone else; only the statements this crate issues write.
    ReadWrite,
    /// File owned by this crate: created with its directory if missing, WAL mode.
    Owned,
}

/// Opens a pool on `config.path`. External stores must already exist: a missing file fails
/// here with `StoreUnavailable` instead of being created empty.
pub async fn open_pool(config: &StoreConfig, access: Access) -> Result<SqlitePool> {
    let timeout = Duration::from_secs(config.busy_timeout_secs);
    let mut opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
        .create_if_missing(false)
        .busy_timeout(timeout);
    match access {
        Access::ReadOnly => opts = opts.read_only(true),
        Access::ReadWrite => {}
        Access::Owned => {
            if let Some(parent) = Path::new(&config.path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::StoreUnavailable(sqlx::Error::Io(e)))?;
            }
            opts = opts
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_pool_size)
        .acquire_timeout(timeout)
        .connect_with(opts)
        .await?;
    Ok(pool)
}
