use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::db::UpsertOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    Created,
    Updated,
    /// Dry run: nothing was written
    Planned,
    Failed,
}

/// What happened to one file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub key: Option<String>,
    pub title: Option<String>,
    pub status: ImportStatus,
    /// The clip was uploaded (false when it was already in the bucket)
    pub uploaded: bool,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub error_message: Option<String>,
}

impl FileOutcome {
    pub(crate) fn failed(path: PathBuf, key: Option<String>, error: String) -> Self {
        Self {
            path,
            key,
            title: None,
            status: ImportStatus::Failed,
            uploaded: false,
            thumbnail_url: None,
            category: None,
            tags: Vec::new(),
            error_message: Some(error),
        }
    }
}

impl From<UpsertOutcome> for ImportStatus {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created => ImportStatus::Created,
            UpsertOutcome::Updated => ImportStatus::Updated,
        }
    }
}

/// Overall import results
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub planned: usize,
    pub failed: usize,
    pub uploaded: usize,
    pub total_time: Duration,
    pub results: Vec<FileOutcome>,
}

impl ImportReport {
    pub fn new(results: Vec<FileOutcome>, total_time: Duration) -> Self {
        let count = |status: ImportStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            created: count(ImportStatus::Created),
            updated: count(ImportStatus::Updated),
            planned: count(ImportStatus::Planned),
            failed: count(ImportStatus::Failed),
            uploaded: results.iter().filter(|r| r.uploaded).count(),
            total_time,
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.results.iter().filter(|r| r.status == ImportStatus::Failed)
    }
}
