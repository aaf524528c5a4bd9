//! Shared fixtures for the catalog integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use jiujitsuteria::error::{CatalogError, Result};
use jiujitsuteria::{Config, ConfigBuilder, FrameExtractor, MemoryObjectStore, Storage};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const VIDEO_DOMAIN: &str = "videos.example.net";
pub const THUMB_DOMAIN: &str = "thumbs.example.net";
pub const TEST_KEY: &str = include_str!("../../shared/bjj-core/tests/fixtures/cloudfront_test_key.pem");

/// Writes a tiny stand-in JPEG instead of running ffmpeg
#[derive(Debug, Default)]
pub struct FakeExtractor {
    pub calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeExtractor {
    pub fn failing() -> Self {
        let extractor = Self::default();
        extractor.fail.store(true, Ordering::SeqCst);
        extractor
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for FakeExtractor {
    async fn extract_frame(&self, video: &Path, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CatalogError::Thumbnail(format!("no frame in {}", video.display())));
        }
        tokio::fs::write(output, b"\xFF\xD8fake-jpeg").await?;
        Ok(())
    }
}

pub fn test_config() -> Config {
    ConfigBuilder::new()
        .with_database_url("sqlite::memory:")
        .with_cdn(VIDEO_DOMAIN, THUMB_DOMAIN)
        .with_memory_storage()
        .with_staff_token("staff-secret")
        .build()
}

/// Both buckets, kept concrete so tests can inspect them
pub struct Buckets {
    pub videos: Arc<MemoryObjectStore>,
    pub thumbnails: Arc<MemoryObjectStore>,
}

impl Buckets {
    pub fn new() -> Self {
        Self {
            videos: Arc::new(MemoryObjectStore::new("videos")),
            thumbnails: Arc::new(MemoryObjectStore::new("thumbnails")),
        }
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.videos.clone(), self.thumbnails.clone())
    }
}

/// Create `relative` under `root` with some bytes, making parent folders
pub fn write_clip(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, format!("clip:{}", relative)).unwrap();
}
