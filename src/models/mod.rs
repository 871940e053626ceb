// Domain models: samples, counters, jobs, maxima

mod counters;
mod job;
mod maxima;
mod sample;

pub use counters::{IoCounters, NodeStats};
pub use job::{CacheFields, JobRecord, JobStats, RUNNING};
pub use maxima::FilesystemMaxima;
pub use sample::{AGGREGATE_NODE, KIND_IO, KIND_METADATA, Sample, SampleKind};
