//! Bulk import of a local folder of clips
//!
//! Files are processed one at a time, each to completion before the next:
//! upload when missing, thumbnail, category from the folder layout, tags from
//! the file name, then an upsert keyed by the canonical URL. A failing file
//! is recorded in the report and the import moves on.

mod report;

pub use report::{FileOutcome, ImportReport, ImportStatus};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::db::{Database, NewVideo};
use crate::error::{CatalogError, Result};
use crate::storage::{PutOptions, Storage};
use crate::thumbnail::{publish_thumbnail, FrameExtractor};
use bjj_core::naming::{canonical_url, category_from_key, key_from_relative_path, title_from_filename};
use bjj_core::{TagMatcher, TagVocabulary};

/// Per-run import switches
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Log intended actions without touching storage or the database
    pub dry_run: bool,
    /// Only files whose name starts with this prefix
    pub prefix: Option<String>,
    pub thumbnails: bool,
}

impl ImportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dry_run: false,
            prefix: config.import.file_prefix.clone(),
            thumbnails: config.import.generate_thumbnails,
        }
    }
}

/// Sequential folder importer
pub struct Importer {
    db: Database,
    storage: Storage,
    extractor: Arc<dyn FrameExtractor>,
    vocabulary: TagVocabulary,
    cdn_domain: String,
    public_domain: Option<String>,
    supported_extensions: Vec<String>,
    video_cache_control: String,
    options: ImportOptions,
}

/// What a single file resolves to before anything is written
struct PlannedFile {
    key: String,
    url: String,
    title: String,
    category: Option<(bjj_core::CategoryKind, String)>,
    tags: Vec<String>,
}

impl Importer {
    pub fn new(
        config: &Config,
        db: Database,
        storage: Storage,
        extractor: Arc<dyn FrameExtractor>,
        vocabulary: TagVocabulary,
        options: ImportOptions,
    ) -> Result<Self> {
        let cdn_domain = config.cdn_domain()?.to_string();
        let public_domain = if options.thumbnails {
            Some(config.public_cdn_domain()?.to_string())
        } else {
            None
        };

        Ok(Self {
            db,
            storage,
            extractor,
            vocabulary,
            cdn_domain,
            public_domain,
            supported_extensions: config
                .import
                .supported_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            video_cache_control: config.storage.video_cache_control.clone(),
            options,
        })
    }

    /// Video files under `dir` matching the extensions and prefix, sorted by path
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(CatalogError::InvalidInput(format!(
                "Import folder does not exist: {}",
                dir.display()
            )));
        }

        let mut videos = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| CatalogError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            let extension_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.supported_extensions.contains(&e.to_lowercase()))
                .unwrap_or(false);
            if !extension_ok {
                continue;
            }

            if let Some(prefix) = self.options.prefix.as_deref() {
                let name = entry.file_name().to_string_lossy();
                if !name.starts_with(prefix) {
                    debug!("Skipping {} (prefix {})", path.display(), prefix);
                    continue;
                }
            }

            videos.push(path.to_path_buf());
        }
        Ok(videos)
    }

    /// Import every matching file under `dir`
    pub async fn run(&self, dir: &Path) -> Result<ImportReport> {
        let start_time = Instant::now();

        info!("🚀 Starting import{}...", if self.options.dry_run { " (dry run)" } else { "" });
        info!("📁 Source: {}", dir.display());

        info!("🔍 Discovering videos...");
        let paths = self.discover(dir)?;
        if paths.is_empty() {
            warn!("No videos found in {}", dir.display());
            return Ok(ImportReport::new(Vec::new(), start_time.elapsed()));
        }
        info!("📹 Found {} videos to import", paths.len());

        let matcher = if self.options.dry_run {
            self.vocabulary.matcher(Vec::<String>::new())
        } else {
            self.vocabulary.matcher(self.db.tag_names().await?)
        };

        let total = paths.len();
        let mut results = Vec::with_capacity(total);
        for (index, path) in paths.into_iter().enumerate() {
            info!("📹 Importing video {}/{}: {}", index + 1, total, path.display());
            let relative = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();

            let outcome = match self.plan(&relative, &matcher) {
                Ok(planned) if self.options.dry_run => self.report_planned(&path, planned),
                Ok(planned) => match self.import_file(&path, &planned).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("❌ Failed to import {}: {}", path.display(), e);
                        FileOutcome::failed(path.clone(), Some(planned.key), e.to_string())
                    }
                },
                Err(e) => {
                    error!("❌ Failed to import {}: {}", path.display(), e);
                    FileOutcome::failed(path.clone(), None, e.to_string())
                }
            };
            results.push(outcome);
        }

        let report = ImportReport::new(results, start_time.elapsed());
        info!("🎉 Import completed in {:.2}s", report.total_time.as_secs_f64());
        info!(
            "✅ Created: {}  🔁 Updated: {}  📝 Planned: {}  ❌ Failed: {}",
            report.created, report.updated, report.planned, report.failed
        );
        Ok(report)
    }

    fn plan(&self, relative: &Path, matcher: &TagMatcher) -> Result<PlannedFile> {
        let key = key_from_relative_path(relative)?;
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());

        Ok(PlannedFile {
            url: canonical_url(&self.cdn_domain, &key),
            title: title_from_filename(&file_name),
            category: category_from_key(&key),
            tags: self.vocabulary.tags_in_filename(matcher, &file_name),
            key,
        })
    }

    fn report_planned(&self, path: &Path, planned: PlannedFile) -> FileOutcome {
        info!(
            "📝 Would import {} as {} ({:?}, category {:?}, tags {:?})",
            path.display(),
            planned.key,
            planned.title,
            planned.category,
            planned.tags
        );
        FileOutcome {
            path: path.to_path_buf(),
            key: Some(planned.key),
            title: Some(planned.title),
            status: ImportStatus::Planned,
            uploaded: false,
            thumbnail_url: None,
            category: planned.category.map(|(kind, name)| format!("{}: {}", kind, name)),
            tags: planned.tags,
            error_message: None,
        }
    }

    async fn import_file(&self, path: &Path, planned: &PlannedFile) -> Result<FileOutcome> {
        let uploaded = if self.storage.videos.exists(&planned.key).await? {
            debug!("⏭️ {} already in {}", planned.key, self.storage.videos.name());
            false
        } else {
            info!("📤 Uploading {} as {}", path.display(), planned.key);
            self.storage
                .videos
                .put_file(path, &planned.key, &PutOptions::video(&self.video_cache_control))
                .await?;
            true
        };

        let thumbnail_url = match self.public_domain.as_deref() {
            Some(public_domain) => {
                match publish_thumbnail(
                    self.extractor.as_ref(),
                    self.storage.thumbnails.as_ref(),
                    public_domain,
                    path,
                    &planned.key,
                )
                .await
                {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("⚠️ No thumbnail for {}: {}", planned.key, e);
                        None
                    }
                }
            }
            None => None,
        };

        let category = match &planned.category {
            Some((kind, name)) => Some(self.db.get_or_create_category(*kind, name).await?),
            None => None,
        };

        let mut video = NewVideo::new(planned.title.clone(), planned.url.clone())
            .with_thumbnail(thumbnail_url.clone());
        if let Some(category) = &category {
            video = video.with_category(category);
        }

        let upsert = self.db.upsert_video(&video).await?;
        self.db.add_video_tags(upsert.id, &planned.tags).await?;

        info!(
            "✅ Saved: {} → {} with tags: {}",
            planned.title,
            planned.url,
            if planned.tags.is_empty() { "none".to_string() } else { planned.tags.join(", ") }
        );

        Ok(FileOutcome {
            path: path.to_path_buf(),
            key: Some(planned.key.clone()),
            title: Some(planned.title.clone()),
            status: upsert.outcome.into(),
            uploaded,
            thumbnail_url,
            category: category.map(|c| format!("{}: {}", c.kind(), c.name())),
            tags: planned.tags.clone(),
            error_message: None,
        })
    }
}
