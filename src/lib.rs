//! Jiujitsuteria - BJJ video catalog
//!
//! Stores instructional clips in a private bucket behind a signed CloudFront
//! distribution, catalogs them by position, technique, guard and tags, and
//! serves a JSON API for browsing, tag search and staff uploads.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod jobs;
pub mod pagination;
pub mod search;
pub mod storage;
pub mod thumbnail;
pub mod upload;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::db::{Database, VideoFilter};
pub use crate::error::{CatalogError, Result};
pub use crate::import::{ImportOptions, ImportReport, Importer};
pub use crate::jobs::{generate_thumbnails, sync_thumbnails, ThumbnailJobReport};
pub use crate::search::{EmptyMatch, MatchMode, TagSearch};
pub use crate::storage::{MemoryObjectStore, ObjectStore, S3ObjectStore, Storage};
pub use crate::thumbnail::{FfmpegFrameExtractor, FrameExtractor};
pub use crate::upload::{UploadRequest, UploadResult, Uploader};
