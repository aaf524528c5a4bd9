//! Tag search: query → matched tags → filtered, paged videos

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SearchConfig;
use crate::db::{Database, VideoFilter, VideoRecord};
use crate::error::Result;
use crate::pagination::Page;
use bjj_core::TagMatcher;

/// How matched tags combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A video must carry every matched tag
    All,
    /// A video must carry at least one matched tag
    Any,
}

/// What a query without any recognized tag returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMatch {
    AllVideos,
    NoVideos,
}

/// Tag search over the catalog
#[derive(Debug, Clone)]
pub struct TagSearch {
    match_mode: MatchMode,
    empty_match: EmptyMatch,
    page_size: usize,
}

/// Outcome of a search request
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub matched_tags: Vec<String>,
    pub videos: Page<VideoRecord>,
}

impl TagSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            match_mode: config.match_mode,
            empty_match: config.empty_match,
            page_size: config.page_size,
        }
    }

    /// Listing filter for the matched tag names; `None` means no videos.
    pub fn filter_for(&self, matched: &[String]) -> Option<VideoFilter> {
        if matched.is_empty() {
            return match self.empty_match {
                EmptyMatch::AllVideos => Some(VideoFilter::All),
                EmptyMatch::NoVideos => None,
            };
        }
        Some(VideoFilter::tag_names(matched, self.match_mode))
    }

    /// Match `query` against the stored tags and list the matching videos
    pub async fn run(&self, db: &Database, query: &str, page: Option<&str>) -> Result<SearchResults> {
        let matcher = TagMatcher::new(db.tag_names().await?);
        let matched_tags = matcher.match_query(query);
        debug!("🔎 {:?} matched tags {:?}", query, matched_tags);

        let videos = match self.filter_for(&matched_tags) {
            Some(filter) => db.videos_page(&filter, page, self.page_size).await?,
            None => Page::empty(),
        };

        Ok(SearchResults {
            query: query.to_string(),
            matched_tags,
            videos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(match_mode: MatchMode, empty_match: EmptyMatch) -> TagSearch {
        TagSearch::new(&SearchConfig {
            match_mode,
            empty_match,
            page_size: 12,
        })
    }

    #[test]
    fn test_empty_match_policy() {
        assert_eq!(
            search(MatchMode::All, EmptyMatch::AllVideos).filter_for(&[]),
            Some(VideoFilter::All)
        );
        assert_eq!(search(MatchMode::All, EmptyMatch::NoVideos).filter_for(&[]), None);
    }

    #[test]
    fn test_matched_tags_become_filter() {
        let matched = vec!["no gi".to_string(), "armbar".to_string(), "no gi".to_string()];
        assert_eq!(
            search(MatchMode::Any, EmptyMatch::AllVideos).filter_for(&matched),
            Some(VideoFilter::TagNames {
                names: vec!["no gi".to_string(), "armbar".to_string()],
                mode: MatchMode::Any,
            })
        );
    }
}
