use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::debug;

use super::{ObjectStore, PutOptions};
use crate::error::{CatalogError, Result};

/// S3 client from the default credential chain, optionally pinned to a region
pub async fn client(region: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;
    Client::new(&sdk_config)
}

/// One S3 bucket
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    async fn put(&self, body: ByteStream, key: &str, options: &PutOptions) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(options.content_type.clone())
            .set_cache_control(options.cache_control.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                CatalogError::Upload(format!(
                    "Failed to upload s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!("📤 Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &str {
        &self.bucket
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    Ok(false)
                } else {
                    Err(CatalogError::Upload(format!(
                        "Failed to check s3://{}/{}: {}",
                        self.bucket,
                        key,
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn put_file(&self, path: &Path, key: &str, options: &PutOptions) -> Result<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            CatalogError::Upload(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.put(body, key, options).await
    }

    async fn put_bytes(&self, bytes: Vec<u8>, key: &str, options: &PutOptions) -> Result<()> {
        self.put(ByteStream::from(bytes), key, options).await
    }

    async fn download_to(&self, key: &str, destination: &Path) -> Result<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                CatalogError::Upload(format!(
                    "Failed to download s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(destination).await?;
        tokio::io::copy(&mut reader, &mut file).await?;

        debug!("📥 Downloaded s3://{}/{} to {}", self.bucket, key, destination.display());
        Ok(())
    }
}
