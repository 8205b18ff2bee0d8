use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Effort;
use crate::types::{AppError, AppResult};

/// Environment variable holding the path of the JSON config file
pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";
/// Prefix for environment overrides of [`PipelineSettings`]
pub const SETTINGS_ENV_PREFIX: &str = "FACEREC";

pub const DEFAULT_HOST: &str = "http://localhost:8080";

// SigV4 presigned URLs are valid for at most seven days
const MAX_SIGNED_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    pub client_key: String,
    pub client_secret: String,
    pub project_service_id: String,
    #[serde(rename = "aws_access_key_id")]
    pub aws_access_key_id: String,
    #[serde(rename = "aws_secret_access_key")]
    pub aws_secret_access_key: String,
    pub bucket_region: String,
    pub bucket_name: String,
    pub local_path: String,
    pub input_file: String,
    pub input_image: String,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// Tuning knobs for job submission and polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub poll_interval_secs: u64,
    pub job_timeout_secs: u64,
    pub poll_fetch_retries: u32,
    pub signed_url_expiry_secs: u64,
    pub quantity: u32,
    pub effort: Effort,
    pub similarity_threshold: f64,
    pub token_ttl_secs: u64,
    pub cleanup_artifacts: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            job_timeout_secs: 4 * 60 * 60,
            poll_fetch_retries: 3,
            signed_url_expiry_secs: 60 * 60,
            quantity: 6,
            effort: Effort::Low,
            similarity_threshold: 0.8,
            token_ttl_secs: 50 * 60,
            cleanup_artifacts: false,
        }
    }
}

impl PipelineSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    fn validate(&self) -> AppResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config("poll_interval_secs must be greater than zero".to_string()));
        }
        if self.job_timeout_secs < self.poll_interval_secs {
            return Err(AppError::Config(
                "job_timeout_secs must be at least poll_interval_secs".to_string(),
            ));
        }
        if self.signed_url_expiry_secs == 0 || self.signed_url_expiry_secs > MAX_SIGNED_URL_EXPIRY_SECS {
            return Err(AppError::Config(format!(
                "signed_url_expiry_secs must be between 1 and {}",
                MAX_SIGNED_URL_EXPIRY_SECS
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AppError::Config("similarity_threshold must be within [0, 1]".to_string()));
        }
        if self.quantity == 0 {
            return Err(AppError::Config("quantity must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl Config {
    /// Load the file named by `APP_CONFIG_FILE`, after reading any `.env`
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::load_from_var(CONFIG_FILE_ENV, SETTINGS_ENV_PREFIX)
    }

    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::load(path.as_ref(), SETTINGS_ENV_PREFIX)
    }

    fn load_from_var(var: &str, env_prefix: &str) -> AppResult<Self> {
        let path = env::var(var).map_err(|_| AppError::Config(format!("{} must be set", var)))?;
        Self::load(Path::new(&path), env_prefix)
    }

    fn load(path: &Path, env_prefix: &str) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let mut config: Config = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        // File values sit under environment overrides
        config.pipeline = ::config::Config::builder()
            .add_source(::config::Config::try_from(&config.pipeline)?)
            .add_source(::config::Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        let required = [
            ("clientKey", &self.client_key),
            ("clientSecret", &self.client_secret),
            ("projectServiceId", &self.project_service_id),
            ("bucketName", &self.bucket_name),
            ("inputFile", &self.input_file),
            ("inputImage", &self.input_image),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} must not be empty", name)));
            }
        }
        self.pipeline.validate()
    }

    /// Local path of the video, `localPath` joined with `inputFile` as-is
    pub fn video_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.local_path, self.input_file))
    }

    pub fn image_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.local_path, self.input_image))
    }

    pub fn video_key(&self) -> &str {
        &self.input_file
    }

    pub fn image_key(&self) -> &str {
        &self.input_image
    }
}
