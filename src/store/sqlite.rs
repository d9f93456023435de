//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the schema created by
//! [`migrate::apply`](crate::migrate::apply). Content bodies are stored as
//! JSON text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::matcher::PatternQuery;
use crate::models::{ContentItem, ContentKind, Favorite, Tag, TagType};

use super::{Association, Store};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
    edit_distance: bool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            edit_distance: true,
        }
    }

    /// Toggle edit-distance scoring; `false` forces pattern lookups.
    pub fn with_edit_distance(mut self, enabled: bool) -> Self {
        self.edit_distance = enabled;
        self
    }
}

const ITEM_COLUMNS: &str = "id, name, kind, content, created_at, updated_at";

fn row_to_item(row: &SqliteRow) -> Result<ContentItem> {
    let kind: String = row.get("kind");
    let content: String = row.get("content");
    let name: String = row.get("name");
    Ok(ContentItem {
        id: row.get("id"),
        kind: kind
            .parse::<ContentKind>()
            .map_err(|e| anyhow::anyhow!(e))?,
        content: serde_json::from_str(&content)
            .with_context(|| format!("corrupt content JSON for '{}'", name))?,
        name,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_tag(row: &SqliteRow) -> Result<Tag> {
    let tag_type: String = row.get("tag_type");
    Ok(Tag {
        id: row.get("id"),
        tag_type: tag_type
            .parse::<TagType>()
            .map_err(|e| anyhow::anyhow!(e))?,
        value: row.get("value"),
    })
}

fn row_to_favorite(row: &SqliteRow) -> Favorite {
    Favorite {
        id: row.get("id"),
        account_id: row.get("account_id"),
        content_name: row.get("content_name"),
        is_favorite: row.get("is_favorite"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_content_items(&self) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM content_items ORDER BY rowid",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn find_content_item(&self, name: &str) -> Result<Option<ContentItem>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM content_items WHERE name = ?",
            ITEM_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn create_content_item(&self, item: &ContentItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_items (id, name, kind, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.kind.as_str())
        .bind(item.content.to_string())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_content_item(&self, item: &ContentItem) -> Result<()> {
        let result = sqlx::query("UPDATE content_items SET content = ?, updated_at = ? WHERE id = ?")
            .bind(item.content.to_string())
            .bind(item.updated_at)
            .bind(&item.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("content item not found: {}", item.id);
        }
        Ok(())
    }

    async fn delete_content_item(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM content_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, tag_type, value FROM tags ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn find_tag(&self, tag_type: TagType, value: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, tag_type, value FROM tags WHERE tag_type = ? AND value = ?")
            .bind(tag_type.as_str())
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn create_tag(&self, tag: &Tag) -> Result<()> {
        sqlx::query("INSERT INTO tags (id, tag_type, value) VALUES (?, ?, ?)")
            .bind(&tag.id)
            .bind(tag.tag_type.as_str())
            .bind(&tag.value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn link_tag(&self, tag_id: &str, item_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO content_item_tags (content_item_id, tag_id) VALUES (?, ?)")
            .bind(item_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_association(&self, association: Association<'_>) -> Result<()> {
        let sql = match association {
            Association::ItemTags(_) => "DELETE FROM content_item_tags WHERE content_item_id = ?",
            Association::TagItems(_) => "DELETE FROM content_item_tags WHERE tag_id = ?",
        };
        sqlx::query(sql)
            .bind(association.id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn item_tags(&self, item_id: &str) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.tag_type, t.value
            FROM tags t
            JOIN content_item_tags l ON l.tag_id = t.id
            WHERE l.content_item_id = ?
            ORDER BY t.tag_type, t.value
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn list_favorites(&self) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            "SELECT id, account_id, content_name, is_favorite, created_at, updated_at FROM favorites ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_favorite).collect())
    }

    async fn find_favorite(
        &self,
        account_id: &str,
        content_name: &str,
    ) -> Result<Option<Favorite>> {
        let row = sqlx::query(
            "SELECT id, account_id, content_name, is_favorite, created_at, updated_at FROM favorites WHERE account_id = ? AND content_name = ?",
        )
        .bind(account_id)
        .bind(content_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_favorite))
    }

    async fn save_favorite(&self, favorite: &Favorite) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO favorites (id, account_id, content_name, is_favorite, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(account_id, content_name) DO UPDATE SET
                is_favorite = excluded.is_favorite,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&favorite.id)
        .bind(&favorite.account_id)
        .bind(&favorite.content_name)
        .bind(favorite.is_favorite)
        .bind(favorite.created_at)
        .bind(favorite.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_favorite(&self, account_id: &str, content_name: &str) -> Result<()> {
        sqlx::query("DELETE FROM favorites WHERE account_id = ? AND content_name = ?")
            .bind(account_id)
            .bind(content_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// One full scan, filtered in Rust so case folding matches
    /// [`PatternQuery::matches`] for non-ASCII text too.
    async fn pattern_search(&self, query: &PatternQuery) -> Result<Option<ContentItem>> {
        if query.conditions.is_empty() {
            return Ok(None);
        }

        let items = self.list_content_items().await?;
        Ok(items.into_iter().find(|item| query.matches(item)))
    }

    fn edit_distance_available(&self) -> bool {
        self.edit_distance
    }
}
