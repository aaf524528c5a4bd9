use super::{Database, NewVideo, UpsertOutcome, UpsertResult, VideoDetail, VideoRecord};
use crate::error::{CatalogError, Result};
use crate::pagination::{Page, PageRequest};
use crate::search::MatchMode;
use bjj_core::CategoryKind;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

const VIDEO_COLUMNS: &str = "v.id, v.title, v.video_url, v.thumbnail_url, v.position_id, \
                             v.technique_id, v.guard_id, v.created_at, v.updated_at";

/// Which videos a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoFilter {
    All,
    Category(CategoryKind, i64),
    Tag(i64),
    /// Videos carrying all (or any) of the named tags
    TagNames { names: Vec<String>, mode: MatchMode },
}

impl VideoFilter {
    pub fn tag_names(names: &[String], mode: MatchMode) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(name) {
                unique.push(name.clone());
            }
        }
        VideoFilter::TagNames { names: unique, mode }
    }

    fn push_where<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        match self {
            VideoFilter::All => {}
            VideoFilter::Category(kind, id) => {
                qb.push(format!(" WHERE v.{} = ", kind.video_column()));
                qb.push_bind(*id);
            }
            VideoFilter::Tag(id) => {
                qb.push(" WHERE v.id IN (SELECT video_id FROM video_tags WHERE tag_id = ");
                qb.push_bind(*id);
                qb.push(")");
            }
            VideoFilter::TagNames { names, .. } if names.is_empty() => {
                qb.push(" WHERE 0");
            }
            VideoFilter::TagNames { names, mode } => {
                qb.push(
                    " WHERE v.id IN (SELECT vt.video_id FROM video_tags vt \
                     JOIN tags t ON t.id = vt.tag_id WHERE t.name IN (",
                );
                let mut list = qb.separated(", ");
                for name in names {
                    list.push_bind(name.as_str());
                }
                qb.push(") GROUP BY vt.video_id");
                if *mode == MatchMode::All {
                    qb.push(" HAVING COUNT(DISTINCT t.id) = ");
                    qb.push_bind(names.len() as i64);
                }
                qb.push(")");
            }
        }
    }
}

impl Database {
    /// Insert or update the video keyed by its canonical URL.
    ///
    /// Title and `updated_at` are always written; thumbnail and category
    /// references only when the new value is present.
    pub async fn upsert_video(&self, video: &NewVideo) -> Result<UpsertResult> {
        if video.video_url.trim().is_empty() {
            return Err(CatalogError::InvalidInput("Video URL is empty".to_string()));
        }

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM videos WHERE video_url = ?1")
            .bind(&video.video_url)
            .fetch_optional(&mut *tx)
            .await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO videos (
                title, video_url, thumbnail_url,
                position_id, technique_id, guard_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(video_url) DO UPDATE SET
                title = excluded.title,
                thumbnail_url = COALESCE(excluded.thumbnail_url, videos.thumbnail_url),
                position_id = COALESCE(excluded.position_id, videos.position_id),
                technique_id = COALESCE(excluded.technique_id, videos.technique_id),
                guard_id = COALESCE(excluded.guard_id, videos.guard_id),
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&video.title)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(video.position_id)
        .bind(video.technique_id)
        .bind(video.guard_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let outcome = if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        };
        debug!("💾 {:?} video {} ({})", outcome, id, video.video_url);
        Ok(UpsertResult { id, outcome })
    }

    pub async fn get_video(&self, id: i64) -> Result<Option<VideoRecord>> {
        let sql = format!("SELECT {} FROM videos v WHERE v.id = ?1", VIDEO_COLUMNS);
        let video = sqlx::query_as::<_, VideoRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(video)
    }

    pub async fn find_video_by_url(&self, video_url: &str) -> Result<Option<VideoRecord>> {
        let sql = format!("SELECT {} FROM videos v WHERE v.video_url = ?1", VIDEO_COLUMNS);
        let video = sqlx::query_as::<_, VideoRecord>(&sql)
            .bind(video_url)
            .fetch_optional(self.pool())
            .await?;
        Ok(video)
    }

    /// Video with categories and tags resolved; missing ids are `NotFound`
    pub async fn video_detail(&self, id: i64) -> Result<VideoDetail> {
        let video = self
            .get_video(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("video {}", id)))?;

        let position = match video.position_id {
            Some(id) => self.get_category(CategoryKind::Position, id).await?,
            None => None,
        };
        let technique = match video.technique_id {
            Some(id) => self.get_category(CategoryKind::Technique, id).await?,
            None => None,
        };
        let guard = match video.guard_id {
            Some(id) => self.get_category(CategoryKind::Guard, id).await?,
            None => None,
        };
        let tags = self.tags_for_video(video.id).await?;

        Ok(VideoDetail {
            video,
            position,
            technique,
            guard,
            tags,
        })
    }

    /// Every video, newest first
    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>> {
        let sql = format!("SELECT {} FROM videos v ORDER BY v.id DESC", VIDEO_COLUMNS);
        let videos = sqlx::query_as::<_, VideoRecord>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(videos)
    }

    pub async fn count_videos(&self, filter: &VideoFilter) -> Result<usize> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos v");
        filter.push_where(&mut qb);
        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool()).await?;
        Ok(count.max(0) as usize)
    }

    /// One page of the videos matching `filter`, newest first.
    ///
    /// `page` is the raw `?page=` value.
    pub async fn videos_page(
        &self,
        filter: &VideoFilter,
        page: Option<&str>,
        page_size: usize,
    ) -> Result<Page<VideoRecord>> {
        let total = self.count_videos(filter).await?;
        let request = PageRequest::resolve(page, total, page_size);

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM videos v", VIDEO_COLUMNS));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY v.id DESC LIMIT ");
        qb.push_bind(request.limit() as i64);
        qb.push(" OFFSET ");
        qb.push_bind(request.offset() as i64);

        let videos = qb
            .build_query_as::<VideoRecord>()
            .fetch_all(self.pool())
            .await?;
        Ok(Page::new(videos, request, total))
    }

    /// Replace a video's tags, creating missing tags
    pub async fn set_video_tags(&self, video_id: i64, names: &[String]) -> Result<()> {
        let mut tag_ids = Vec::with_capacity(names.len());
        for name in names {
            tag_ids.push(self.get_or_create_tag(name).await?.id);
        }

        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM video_tags WHERE video_id = ?1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT OR IGNORE INTO video_tags (video_id, tag_id) VALUES (?1, ?2)")
                .bind(video_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Add tags to a video, keeping the ones it already has
    pub async fn add_video_tags(&self, video_id: i64, names: &[String]) -> Result<()> {
        for name in names {
            let tag = self.get_or_create_tag(name).await?;
            sqlx::query("INSERT OR IGNORE INTO video_tags (video_id, tag_id) VALUES (?1, ?2)")
                .bind(video_id)
                .bind(tag.id)
                .execute(self.pool())
                .await?;
        }
        Ok(())
    }

    pub async fn update_thumbnail_url(&self, video_id: i64, thumbnail_url: &str) -> Result<()> {
        let result = sqlx::query("UPDATE videos SET thumbnail_url = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(thumbnail_url)
            .bind(Utc::now())
            .bind(video_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(format!("video {}", video_id)));
        }
        Ok(())
    }

    pub async fn delete_video(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
