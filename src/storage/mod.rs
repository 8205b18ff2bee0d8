// Storage layer (S3-compatible)

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::models::Locator;
use crate::types::{AppResult, UrlMode};

pub mod s3_client;

pub use s3_client::*;

/// Raw object storage operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload_file(&self, local_path: &Path, bucket: &str, key: &str) -> AppResult<()>;

    async fn download_file(&self, bucket: &str, key: &str, local_path: &Path) -> AppResult<()>;

    async fn delete_object(&self, bucket: &str, key: &str) -> AppResult<()>;

    /// Time-bounded URL usable without further credentials
    async fn signed_url(&self, bucket: &str, key: &str, expiry: Duration, mode: UrlMode) -> AppResult<String>;
}

/// One bucket with a fixed signed URL expiry
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    expiry: Duration,
}

impl Storage {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, expiry: Duration) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            expiry,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn upload(&self, local_path: &Path, key: &str) -> AppResult<()> {
        info!(path = %local_path.display(), bucket = %self.bucket, key, "Uploading to storage");
        self.store.upload_file(local_path, &self.bucket, key).await?;
        info!(key, "Upload finished");
        Ok(())
    }

    pub async fn download(&self, key: &str, local_path: &Path) -> AppResult<()> {
        info!(bucket = %self.bucket, key, path = %local_path.display(), "Downloading from storage");
        self.store.download_file(&self.bucket, key, local_path).await
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        info!(bucket = %self.bucket, key, "Deleting storage artifact");
        self.store.delete_object(&self.bucket, key).await
    }

    async fn signed_url(&self, key: &str, mode: UrlMode) -> AppResult<String> {
        self.store.signed_url(&self.bucket, key, self.expiry, mode).await
    }

    /// Locator with a GET URL, for objects a job reads
    pub async fn input_locator(&self, key: &str) -> AppResult<Locator> {
        self.locator(key, UrlMode::Get).await
    }

    /// Locator with a PUT URL, for objects a job writes
    pub async fn output_locator(&self, key: &str) -> AppResult<Locator> {
        self.locator(key, UrlMode::Put).await
    }

    async fn locator(&self, key: &str, mode: UrlMode) -> AppResult<Locator> {
        let url = self.signed_url(key, mode).await?;
        Ok(Locator {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            url,
        })
    }
}
