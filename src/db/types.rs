//! Row types returned by the catalog database.

use bjj_core::CategoryRef;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A free-form tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A category with the number of videos filed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub id: i64,
    pub name: String,
    pub video_count: i64,
}

/// A `videos` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VideoRecord {
    pub id: i64,
    pub title: String,
    /// Canonical (unsigned) CDN URL of the clip
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub position_id: Option<i64>,
    pub technique_id: Option<i64>,
    pub guard_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A video with its categories and tags resolved
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: VideoRecord,
    pub position: Option<CategoryRef>,
    pub technique: Option<CategoryRef>,
    pub guard: Option<CategoryRef>,
    pub tags: Vec<Tag>,
}

/// Values written by an upsert.
///
/// `None` optional fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVideo {
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub position_id: Option<i64>,
    pub technique_id: Option<i64>,
    pub guard_id: Option<i64>,
}

impl NewVideo {
    pub fn new(title: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            video_url: video_url.into(),
            ..Self::default()
        }
    }

    /// Set the reference matching the category's kind
    pub fn with_category(mut self, category: &CategoryRef) -> Self {
        match category {
            CategoryRef::Position(c) => self.position_id = Some(c.id),
            CategoryRef::Technique(c) => self.technique_id = Some(c.id),
            CategoryRef::Guard(c) => self.guard_id = Some(c.id),
        }
        self
    }

    pub fn with_thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail_url = url;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertResult {
    pub id: i64,
    pub outcome: UpsertOutcome,
}
