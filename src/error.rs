// Error taxonomy shared by the store adapters and the attribution engine.

/// Errors surfaced by the adapters and the core pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sample store or job registry connection failed or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error(
        "no samples for filesystem '{filesystem}' in the last {lookback_secs}s; \
         filesystem appears idle or stale"
    )]
    NoRecentSamples {
        filesystem: String,
        lookback_secs: i64,
    },

    #[error("invalid sort key '{0}': use meta, iops or bw")]
    InvalidSortKey(String),

    #[error("malformed sample for node '{node}': {reason}")]
    MalformedSample { node: String, reason: String },

    /// A query parameter could not be encoded.
    #[error("encoding query parameter: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A lifetime total no longer fits the registry's signed integer columns.
    #[error("counter {counter} of job '{job_id}' exceeds the registry's integer range")]
    CounterOverflow {
        job_id: String,
        counter: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
