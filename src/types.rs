// Shared error type and small enums used across the pipeline

use std::path::PathBuf;
use std::time::Duration;

/// Access mode a signed URL is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMode {
    /// Read access, used for job inputs
    Get,
    /// Write access, used for declared job outputs
    Put,
}

impl std::fmt::Display for UrlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlMode::Get => write!(f, "GET"),
            UrlMode::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mediator API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Job {job_id} completed without {field} in its output")]
    MissingOutput { job_id: String, field: &'static str },

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Job {job_id} did not finish within {waited:?}")]
    JobTimeout { job_id: String, waited: Duration },
}

impl AppError {
    /// Errors worth retrying: transport failures and server-side 5xx responses
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            AppError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<s3::error::S3Error> for AppError {
    fn from(e: s3::error::S3Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<::config::ConfigError> for AppError {
    fn from(e: ::config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
