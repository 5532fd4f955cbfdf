//! Review item persistence
//!
//! Every write is a full-record upsert keyed by content id in a single
//! statement, so concurrent readers never see a half-updated record.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uwrite_common::Result;

use crate::models::ReviewItem;

/// Keyed save/lookup of review items
#[async_trait]
pub trait ReviewItemStore: Send + Sync {
    /// Insert or fully replace the record for `item.content_id`
    async fn save(&self, item: &ReviewItem) -> Result<()>;

    async fn find_by_content_id(&self, content_id: &str) -> Result<Option<ReviewItem>>;
}

/// SQLite-backed review item store
#[derive(Debug, Clone)]
pub struct SqliteItemStore {
    db: SqlitePool,
}

impl SqliteItemStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Count stored items
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review_items")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Load every item, ordered by content id
    pub async fn load_all(&self) -> Result<Vec<ReviewItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content_id, site_id, assignment_ref, user_id, link, edit_link, score, error
            FROM review_items
            ORDER BY content_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.iter().map(item_from_row).collect())
    }
}

fn item_from_row(row: &sqlx::sqlite::SqliteRow) -> ReviewItem {
    ReviewItem {
        id: row.get("id"),
        content_id: row.get("content_id"),
        site_id: row.get("site_id"),
        assignment_ref: row.get("assignment_ref"),
        user_id: row.get("user_id"),
        link: row.get("link"),
        edit_link: row.get("edit_link"),
        score: row.get("score"),
        error: row.get("error"),
    }
}

#[async_trait]
impl ReviewItemStore for SqliteItemStore {
    async fn save(&self, item: &ReviewItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_items
                (content_id, site_id, assignment_ref, user_id, link, edit_link, score, error, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT(content_id) DO UPDATE SET
                site_id = excluded.site_id,
                assignment_ref = excluded.assignment_ref,
                user_id = excluded.user_id,
                link = excluded.link,
                edit_link = excluded.edit_link,
                score = excluded.score,
                error = excluded.error,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&item.content_id)
        .bind(&item.site_id)
        .bind(&item.assignment_ref)
        .bind(&item.user_id)
        .bind(&item.link)
        .bind(&item.edit_link)
        .bind(item.score)
        .bind(&item.error)
        .execute(&self.db)
        .await?;

        tracing::debug!(content_id = %item.content_id, state = ?item.state(), "Saved review item");

        Ok(())
    }

    async fn find_by_content_id(&self, content_id: &str) -> Result<Option<ReviewItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, content_id, site_id, assignment_ref, user_id, link, edit_link, score, error
            FROM review_items
            WHERE content_id = ?
            "#,
        )
        .bind(content_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(item_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;
    use crate::models::ReviewState;

    async fn store() -> SqliteItemStore {
        let pool = init_memory_pool().await.expect("Failed to create in-memory database");
        SqliteItemStore::new(pool)
    }

    #[tokio::test]
    async fn test_save_and_load_item() {
        let store = store().await;
        let mut item = ReviewItem::pending("/attachment/a.docx", "u1", "s1", "/assignment/1");
        item.succeed(85, "https://x/1".into(), Some("https://x/1/edit".into()));

        store.save(&item).await.unwrap();
        let loaded = store
            .find_by_content_id("/attachment/a.docx")
            .await
            .unwrap()
            .expect("Item not found");

        assert!(loaded.id.is_some());
        assert_eq!(loaded.score, Some(85));
        assert_eq!(loaded.link.as_deref(), Some("https://x/1"));
        assert_eq!(loaded.edit_link.as_deref(), Some("https://x/1/edit"));
        assert_eq!(loaded.site_id, "s1");
    }

    #[tokio::test]
    async fn test_missing_item_is_none() {
        let store = store().await;
        assert!(store.find_by_content_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert_last_writer_wins() {
        let store = store().await;
        let mut item = ReviewItem::pending("c1", "u1", "s1", "a1");
        item.fail("timeout");
        store.save(&item).await.unwrap();

        // Fresh submission for the same content id resets the record
        let resubmitted = ReviewItem::pending("c1", "u2", "s1", "a1");
        store.save(&resubmitted).await.unwrap();

        let loaded = store.find_by_content_id("c1").await.unwrap().unwrap();
        assert_eq!(loaded.state(), ReviewState::Pending);
        assert_eq!(loaded.user_id, "u2");
        assert!(loaded.error.is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
