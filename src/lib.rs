pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{clock::TokioSleeper, storage::LocalStorage};
pub use crate::app::pipelines::export_pipeline::ExportPipeline;
pub use crate::config::{cli::CliArgs, RetryPolicy, RunConfig};
pub use crate::core::{
    etl::{EtlEngine, RunReport},
    flatten::flatten,
    paginator::{FetchOutcome, PageFetcher, StopReason},
};
pub use crate::utils::error::{EtlError, Result};
