use super::{Database, Tag};
use crate::error::{CatalogError, Result};

impl Database {
    /// Tag with this exact name, created when missing
    pub async fn get_or_create_tag(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidInput("Tag name is empty".to_string()));
        }

        sqlx::query("INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(self.pool())
            .await?;

        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?1")
            .bind(name)
            .fetch_one(self.pool())
            .await?;
        Ok(tag)
    }

    pub async fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(tag)
    }

    pub async fn require_tag(&self, id: i64) -> Result<Tag> {
        self.get_tag(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("tag {}", id)))
    }

    /// All tags ordered by name
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(tags)
    }

    /// Names of all stored tags, the vocabulary search queries are matched against
    pub async fn tag_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM tags ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(names)
    }

    pub async fn tags_for_video(&self, video_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name FROM tags t \
             JOIN video_tags vt ON vt.tag_id = t.id \
             WHERE vt.video_id = ?1 ORDER BY t.name",
        )
        .bind(video_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tags)
    }
}
