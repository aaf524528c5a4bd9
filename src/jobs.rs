//! One-shot thumbnail maintenance jobs

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::db::{Database, VideoRecord};
use crate::error::Result;
use crate::storage::Storage;
use crate::thumbnail::{publish_thumbnail, FrameExtractor};
use bjj_core::naming::{canonical_url, key_from_url, thumbnail_key};

/// Outcome of a thumbnail job
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThumbnailJobReport {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// `(video id, error)` per failed video
    pub failures: Vec<(i64, String)>,
    pub total_time: Duration,
}

impl ThumbnailJobReport {
    fn record_failure(&mut self, video: &VideoRecord, message: String) {
        error!("❌ Thumbnail failed for video {} ({}): {}", video.id, video.title, message);
        self.failed += 1;
        self.failures.push((video.id, message));
    }
}

/// Regenerate thumbnails for every video from its clip in the private bucket.
///
/// A failing video is counted and the job moves on to the next one.
pub async fn generate_thumbnails(
    db: &Database,
    storage: &Storage,
    extractor: &dyn FrameExtractor,
    cdn_domain: &str,
    public_domain: &str,
) -> Result<ThumbnailJobReport> {
    let start_time = Instant::now();
    let videos = db.list_videos().await?;
    info!("🖼️ Generating thumbnails for {} videos", videos.len());

    let mut report = ThumbnailJobReport {
        total: videos.len(),
        ..ThumbnailJobReport::default()
    };

    for (index, video) in videos.iter().enumerate() {
        info!("🖼️ Video {}/{}: {}", index + 1, videos.len(), video.title);
        match regenerate(db, storage, extractor, cdn_domain, public_domain, video).await {
            Ok(url) => {
                info!("✅ Thumbnail for {}: {}", video.id, url);
                report.updated += 1;
            }
            Err(e) => report.record_failure(video, e.to_string()),
        }
    }

    report.total_time = start_time.elapsed();
    info!(
        "🎉 Thumbnails done: {} updated, {} failed in {:.2}s",
        report.updated,
        report.failed,
        report.total_time.as_secs_f64()
    );
    Ok(report)
}

async fn regenerate(
    db: &Database,
    storage: &Storage,
    extractor: &dyn FrameExtractor,
    cdn_domain: &str,
    public_domain: &str,
    video: &VideoRecord,
) -> Result<String> {
    let key = key_from_url(cdn_domain, &video.video_url)?;

    let scratch = tempfile::tempdir()?;
    let local = scratch.path().join("video.mp4");
    storage.videos.download_to(&key, &local).await?;

    let url = publish_thumbnail(extractor, storage.thumbnails.as_ref(), public_domain, &local, &key).await?;
    db.update_thumbnail_url(video.id, &url).await?;
    Ok(url)
}

/// Point every video's thumbnail URL at the public bucket layout without
/// touching storage. With `only_missing`, videos that already have a
/// thumbnail are left alone.
pub async fn sync_thumbnails(
    db: &Database,
    cdn_domain: &str,
    public_domain: &str,
    only_missing: bool,
) -> Result<ThumbnailJobReport> {
    let start_time = Instant::now();
    let videos = db.list_videos().await?;
    info!("🔗 Syncing thumbnail URLs for {} videos", videos.len());

    let mut report = ThumbnailJobReport {
        total: videos.len(),
        ..ThumbnailJobReport::default()
    };

    for video in &videos {
        if only_missing && video.thumbnail_url.is_some() {
            report.skipped += 1;
            continue;
        }

        let key = match key_from_url(cdn_domain, &video.video_url) {
            Ok(key) => key,
            Err(e) => {
                warn!("⚠️ Cannot derive a key for video {}", video.id);
                report.record_failure(video, e.to_string());
                continue;
            }
        };

        let url = canonical_url(public_domain, &thumbnail_key(&key));
        if video.thumbnail_url.as_deref() == Some(url.as_str()) {
            report.skipped += 1;
            continue;
        }

        match db.update_thumbnail_url(video.id, &url).await {
            Ok(()) => {
                info!("✅ Updated thumbnail for: {}", video.title);
                report.updated += 1;
            }
            Err(e) => report.record_failure(video, e.to_string()),
        }
    }

    report.total_time = start_time.elapsed();
    info!("🎉 Updated {} thumbnail URLs, skipped {}", report.updated, report.skipped);
    Ok(report)
}
