//! Object storage for clips and thumbnails
//!
//! Clips go to a private bucket served through the signed CDN distribution;
//! thumbnails go to a public bucket behind the unsigned one.

mod memory;
mod s3;

pub use memory::{MemoryObjectStore, StoredObject};
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::error::Result;

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// Headers stored with an uploaded object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

impl PutOptions {
    pub fn video(cache_control: &str) -> Self {
        Self {
            content_type: Some(VIDEO_CONTENT_TYPE.to_string()),
            cache_control: Some(cache_control.to_string()),
        }
    }

    pub fn thumbnail() -> Self {
        Self {
            content_type: Some(THUMBNAIL_CONTENT_TYPE.to_string()),
            cache_control: None,
        }
    }
}

/// A single bucket. Failures are reported as `CatalogError::Upload`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, for logs
    fn name(&self) -> &str;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn put_file(&self, path: &Path, key: &str, options: &PutOptions) -> Result<()>;

    async fn put_bytes(&self, bytes: Vec<u8>, key: &str, options: &PutOptions) -> Result<()>;

    /// Download an object into a local file, replacing it
    async fn download_to(&self, key: &str, destination: &Path) -> Result<()>;
}

/// The private video bucket and the public thumbnail bucket
#[derive(Clone)]
pub struct Storage {
    pub videos: Arc<dyn ObjectStore>,
    pub thumbnails: Arc<dyn ObjectStore>,
}

impl Storage {
    pub fn new(videos: Arc<dyn ObjectStore>, thumbnails: Arc<dyn ObjectStore>) -> Self {
        Self { videos, thumbnails }
    }

    /// Both buckets in process memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryObjectStore::new("videos")),
            Arc::new(MemoryObjectStore::new("thumbnails")),
        )
    }

    /// Build the configured backend
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("🪣 Using in-memory object storage");
                Ok(Self::in_memory())
            }
            StorageBackend::S3 => {
                let client = s3::client(config.storage.region.as_deref()).await;
                let videos = S3ObjectStore::new(client.clone(), config.private_bucket()?);
                let thumbnails = S3ObjectStore::new(client, config.public_bucket()?);
                info!(
                    "🪣 Using S3 buckets {} (videos) and {} (thumbnails)",
                    videos.name(),
                    thumbnails.name()
                );
                Ok(Self::new(Arc::new(videos), Arc::new(thumbnails)))
            }
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("videos", &self.videos.name())
            .field("thumbnails", &self.thumbnails.name())
            .finish()
    }
}
