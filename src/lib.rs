// Library for tests to access modules

pub mod accumulator;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod job_repo;
pub mod mapper;
pub mod maxima_repo;
pub mod models;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod sample_repo;
pub mod skip;
pub mod store;
