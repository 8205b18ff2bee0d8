// Facerec Pipeline - drives extract, cluster and search face-recognition jobs

pub mod cli;
pub mod config;
pub mod jobs;
pub mod mediator;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use crate::config::Config;
pub use crate::pipeline::{Pipeline, PipelineReport};
pub use crate::types::{AppError, AppResult};
