//! Position, technique and guard tables.
//!
//! All three share the `(id, name)` shape; the table is picked from the
//! [`CategoryKind`] so callers never branch on it.

use super::{CategoryCount, Database};
use crate::error::{CatalogError, Result};
use bjj_core::category::Category;
use bjj_core::{CategoryKind, CategoryRef};
use tracing::debug;

impl Database {
    pub async fn create_category(&self, kind: CategoryKind, name: &str) -> Result<CategoryRef> {
        let name = category_name(name)?;
        let sql = format!("INSERT INTO {} (name) VALUES (?1)", kind.table());
        let id = sqlx::query(&sql)
            .bind(name)
            .execute(self.pool())
            .await?
            .last_insert_rowid();

        debug!("➕ Created {} {:?} (id {})", kind, name, id);
        Ok(CategoryRef::new(
            kind,
            Category {
                id,
                name: name.to_string(),
            },
        ))
    }

    /// Existing category with this exact name (lowest id wins), else a new one
    pub async fn get_or_create_category(&self, kind: CategoryKind, name: &str) -> Result<CategoryRef> {
        let name = category_name(name)?;
        let sql = format!(
            "SELECT id, name FROM {} WHERE name = ?1 ORDER BY id LIMIT 1",
            kind.table()
        );
        let existing = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(name)
            .fetch_optional(self.pool())
            .await?;

        match existing {
            Some((id, name)) => Ok(CategoryRef::new(kind, Category { id, name })),
            None => self.create_category(kind, name).await,
        }
    }

    pub async fn get_category(&self, kind: CategoryKind, id: i64) -> Result<Option<CategoryRef>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?1", kind.table());
        let row = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|(id, name)| CategoryRef::new(kind, Category { id, name })))
    }

    /// Like [`Database::get_category`] but a missing row is `NotFound`
    pub async fn require_category(&self, kind: CategoryKind, id: i64) -> Result<CategoryRef> {
        self.get_category(kind, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("{} {}", kind, id)))
    }

    /// All categories of a kind, ordered by name
    pub async fn list_categories(&self, kind: CategoryKind) -> Result<Vec<CategoryRef>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name, id", kind.table());
        let rows = sqlx::query_as::<_, (i64, String)>(&sql)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| CategoryRef::new(kind, Category { id, name }))
            .collect())
    }

    /// All categories of a kind with their video counts, ordered by name
    pub async fn list_categories_with_counts(&self, kind: CategoryKind) -> Result<Vec<CategoryCount>> {
        let sql = format!(
            "SELECT c.id, c.name, COUNT(v.id) AS video_count \
             FROM {table} c LEFT JOIN videos v ON v.{column} = c.id \
             GROUP BY c.id, c.name ORDER BY c.name, c.id",
            table = kind.table(),
            column = kind.video_column()
        );
        let rows = sqlx::query_as::<_, CategoryCount>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Delete a category; videos filed under it keep existing with the
    /// reference cleared.
    pub async fn delete_category(&self, kind: CategoryKind, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(self.pool()).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn category_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::InvalidInput("Category name is empty".to_string()));
    }
    Ok(name)
}
