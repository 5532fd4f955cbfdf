//! User preference persistence (preferred report locale)

use async_trait::async_trait;
use sqlx::SqlitePool;
use uwrite_common::Result;

use crate::services::locale::LocaleResolver;

/// Set the preferred locale for a user
pub async fn set_user_locale(db: &SqlitePool, user_id: &str, locale: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO user_preferences (user_id, locale) VALUES (?, ?)
         ON CONFLICT(user_id) DO UPDATE SET locale = excluded.locale",
    )
    .bind(user_id)
    .bind(locale)
    .execute(db)
    .await?;

    Ok(())
}

/// Get the preferred locale for a user, if set
pub async fn get_user_locale(db: &SqlitePool, user_id: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT locale FROM user_preferences WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db)
            .await?;

    Ok(row.map(|(locale,)| locale))
}

/// Locale resolver reading the `user_preferences` table
#[derive(Debug, Clone)]
pub struct DbLocaleResolver {
    db: SqlitePool,
}

impl DbLocaleResolver {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocaleResolver for DbLocaleResolver {
    async fn preferred_locale(&self, user_id: &str) -> Result<Option<String>> {
        get_user_locale(&self.db, user_id).await
    }
}
