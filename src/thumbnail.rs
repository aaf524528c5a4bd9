//! Thumbnail frame extraction

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::config::ImportConfig;
use crate::error::{CatalogError, Result};
use crate::storage::{ObjectStore, PutOptions};
use bjj_core::naming::{canonical_url, thumbnail_key};

/// Pulls a representative still image out of a video file
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write a JPEG frame of `video` to `output`
    async fn extract_frame(&self, video: &Path, output: &Path) -> Result<()>;
}

/// Frame extraction through the `ffmpeg` command line tool
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    ffmpeg_path: String,
    seek: String,
    width: u32,
}

impl FfmpegFrameExtractor {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            seek: config.thumbnail_seek.clone(),
            width: config.thumbnail_width,
        }
    }

    fn args(&self, video: &Path, output: &Path) -> Vec<String> {
        vec![
            "-ss".to_string(),
            self.seek.clone(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-vframes".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            format!("scale={}:-1", self.width),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(&self, video: &Path, output: &Path) -> Result<()> {
        let result = tokio::process::Command::new(&self.ffmpeg_path)
            .args(self.args(video, output))
            .output()
            .await
            .map_err(|e| CatalogError::Thumbnail(format!("Failed to run {}: {}", self.ffmpeg_path, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CatalogError::Thumbnail(format!(
                "ffmpeg failed for {}: {}",
                video.display(),
                stderr.lines().last().unwrap_or("no output")
            )));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(CatalogError::Thumbnail(format!(
                "ffmpeg produced no frame for {}",
                video.display()
            )));
        }

        debug!("🖼️ Extracted frame of {} to {}", video.display(), output.display());
        Ok(())
    }
}

/// Extract a frame of a local clip and upload it as the clip's thumbnail.
///
/// Returns the public thumbnail URL.
pub async fn publish_thumbnail(
    extractor: &dyn FrameExtractor,
    thumbnails: &dyn ObjectStore,
    public_domain: &str,
    video: &Path,
    video_key: &str,
) -> Result<String> {
    let scratch = tempfile::tempdir()?;
    let frame = scratch.path().join("frame.jpg");
    extractor.extract_frame(video, &frame).await?;

    let key = thumbnail_key(video_key);
    thumbnails.put_file(&frame, &key, &PutOptions::thumbnail()).await?;
    Ok(canonical_url(public_domain, &key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ffmpeg_arguments() {
        let extractor = FfmpegFrameExtractor::default();
        let args = extractor.args(&PathBuf::from("/tmp/clip.mp4"), &PathBuf::from("/tmp/clip.jpg"));
        assert_eq!(
            args,
            vec![
                "-ss", "00:00:01.000", "-i", "/tmp/clip.mp4", "-vframes", "1", "-vf", "scale=320:-1",
                "-y", "/tmp/clip.jpg"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_thumbnail_error() {
        let extractor = FfmpegFrameExtractor {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            seek: "00:00:01.000".to_string(),
            width: 320,
        };
        let dir = tempfile::tempdir().unwrap();
        let err = extractor
            .extract_frame(&dir.path().join("a.mp4"), &dir.path().join("a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Thumbnail(_)));
    }
}
