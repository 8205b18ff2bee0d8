// S3 client backed by rust-s3, path-style addressing with SigV4 signing

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::ObjectStore;
use crate::config::Config;
use crate::types::{AppError, AppResult, UrlMode};

pub struct S3Client {
    region: Region,
    credentials: Credentials,
}

impl S3Client {
    pub fn new(region_name: &str, access_key_id: &str, secret_access_key: &str) -> AppResult<Self> {
        let region: Region = region_name
            .parse()
            .map_err(|e| AppError::Config(format!("invalid bucket region {}: {}", region_name, e)))?;
        let credentials = Credentials::new(Some(access_key_id), Some(secret_access_key), None, None, None)
            .map_err(|e| AppError::Config(format!("invalid storage credentials: {}", e)))?;

        Ok(Self { region, credentials })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.bucket_region,
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
        )
    }

    fn bucket(&self, name: &str) -> AppResult<Box<Bucket>> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        Ok(Box::new(bucket.with_path_style()))
    }
}

fn expiry_secs(expiry: Duration) -> AppResult<u32> {
    u32::try_from(expiry.as_secs())
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| AppError::InvalidRequest(format!("unsupported signed URL expiry {:?}", expiry)))
}

fn check_status(status: u16, action: &str, key: &str) -> AppResult<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::Storage(format!("{} {} returned HTTP {}", action, key, status)))
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn upload_file(&self, local_path: &Path, bucket: &str, key: &str) -> AppResult<()> {
        let content = tokio::fs::read(local_path)
            .await
            .map_err(|e| AppError::io(local_path, e))?;
        debug!(bucket, key, bytes = content.len(), "Putting object");

        let response = self.bucket(bucket)?.put_object(key, &content).await?;
        check_status(response.status_code(), "PUT", key)
    }

    async fn download_file(&self, bucket: &str, key: &str, local_path: &Path) -> AppResult<()> {
        let response = self.bucket(bucket)?.get_object(key).await?;
        check_status(response.status_code(), "GET", key)?;

        tokio::fs::write(local_path, response.bytes())
            .await
            .map_err(|e| AppError::io(local_path, e))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> AppResult<()> {
        let response = self.bucket(bucket)?.delete_object(key).await?;
        check_status(response.status_code(), "DELETE", key)
    }

    async fn signed_url(&self, bucket: &str, key: &str, expiry: Duration, mode: UrlMode) -> AppResult<String> {
        let secs = expiry_secs(expiry)?;
        let bucket = self.bucket(bucket)?;
        let url = match mode {
            UrlMode::Get => bucket.presign_get(key, secs, None).await?,
            UrlMode::Put => bucket.presign_put(key, secs, None).await?,
        };
        Ok(url)
    }
}
