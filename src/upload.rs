//! Staff upload of a single clip

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Database, NewVideo, UpsertOutcome};
use crate::error::{CatalogError, Result};
use crate::storage::{PutOptions, Storage};
use crate::thumbnail::{publish_thumbnail, FrameExtractor};
use bjj_core::naming::{canonical_url, storage_key, title_from_filename};
use bjj_core::{CategoryKind, CategoryRef};

/// A clip submitted through the upload form
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Display title; derived from the filename when blank
    pub title: String,
    /// Name of the file as sent by the client
    pub filename: String,
    pub bytes: Vec<u8>,
    pub guard_id: Option<i64>,
    pub position_id: Option<i64>,
    pub technique_id: Option<i64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub video_id: i64,
    pub key: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub outcome: UpsertOutcome,
}

/// Uploads clips and records them in the catalog
pub struct Uploader {
    db: Database,
    storage: Storage,
    extractor: Option<Arc<dyn FrameExtractor>>,
    cdn_domain: String,
    public_domain: Option<String>,
    video_cache_control: String,
}

impl Uploader {
    /// Thumbnails are produced only when an extractor is given and the
    /// public CDN domain is configured.
    pub fn new(
        config: &Config,
        db: Database,
        storage: Storage,
        extractor: Option<Arc<dyn FrameExtractor>>,
    ) -> Result<Self> {
        Ok(Self {
            db,
            storage,
            extractor,
            cdn_domain: config.cdn_domain()?.to_string(),
            public_domain: config.cdn.public_domain.clone(),
            video_cache_control: config.storage.video_cache_control.clone(),
        })
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        if request.bytes.is_empty() {
            return Err(CatalogError::InvalidInput("Uploaded file is empty".to_string()));
        }

        let guard = self.resolve(CategoryKind::Guard, request.guard_id).await?;
        let position = self.resolve(CategoryKind::Position, request.position_id).await?;
        let technique = self.resolve(CategoryKind::Technique, request.technique_id).await?;

        let primary = CategoryRef::primary(guard.as_ref(), position.as_ref(), technique.as_ref());
        let key = storage_key(primary.map(|c| (c.kind(), c.name())), &request.filename)?;
        let video_url = canonical_url(&self.cdn_domain, &key);

        let title = if request.title.trim().is_empty() {
            title_from_filename(&request.filename)
        } else {
            request.title.trim().to_string()
        };

        info!("📤 Uploading {} ({} bytes) to {}", key, request.bytes.len(), self.storage.videos.name());
        let scratch = tempfile::tempdir()?;
        let local = scratch.path().join("upload.mp4");
        tokio::fs::write(&local, &request.bytes).await?;
        self.storage
            .videos
            .put_file(&local, &key, &PutOptions::video(&self.video_cache_control))
            .await?;
        let thumbnail_url = self.thumbnail(&local, &key).await;

        let mut video = NewVideo::new(title, video_url.clone()).with_thumbnail(thumbnail_url.clone());
        for category in [&guard, &position, &technique].into_iter().flatten() {
            video = video.with_category(category);
        }
        let upsert = self.db.upsert_video(&video).await?;
        self.db.set_video_tags(upsert.id, &request.tags).await?;

        info!("✅ Uploaded video {} ({:?})", upsert.id, upsert.outcome);

        Ok(UploadResult {
            video_id: upsert.id,
            key,
            video_url,
            thumbnail_url,
            outcome: upsert.outcome,
        })
    }

    async fn resolve(&self, kind: CategoryKind, id: Option<i64>) -> Result<Option<CategoryRef>> {
        match id {
            Some(id) => Ok(Some(self.db.require_category(kind, id).await?)),
            None => Ok(None),
        }
    }

    /// Thumbnail failures do not fail the upload
    async fn thumbnail(&self, local: &Path, key: &str) -> Option<String> {
        let (extractor, public_domain) = match (&self.extractor, &self.public_domain) {
            (Some(extractor), Some(public_domain)) => (extractor, public_domain),
            _ => return None,
        };

        match publish_thumbnail(
            extractor.as_ref(),
            self.storage.thumbnails.as_ref(),
            public_domain,
            local,
            key,
        )
        .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("⚠️ No thumbnail for {}: {}", key, e);
                None
            }
        }
    }
}
