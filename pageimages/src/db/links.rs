//! Outbound links of stored pages

use crate::denylist::LinkStore;
use crate::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// [`LinkStore`] over the `page` and `pagelinks` tables
#[derive(Clone)]
pub struct SqliteLinkStore {
    pool: SqlitePool,
}

impl SqliteLinkStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a link from `page_id` to `target_namespace:target_title`
    pub async fn add_link(&self, page_id: i64, target_namespace: i64, target_title: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO pagelinks (pl_from, pl_namespace, pl_title) VALUES (?, ?, ?)")
            .bind(page_id)
            .bind(target_namespace)
            .bind(target_title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn links_from(&self, namespace: i64, title: &str, target_namespace: i64) -> Result<Vec<String>> {
        let page = sqlx::query_as::<_, (i64,)>(
            "SELECT page_id FROM page WHERE page_namespace = ? AND page_title = ?",
        )
        .bind(namespace)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        let Some((page_id,)) = page else {
            tracing::debug!(namespace, title = %title, "Denylist page does not exist");
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT pl_title FROM pagelinks WHERE pl_from = ? AND pl_namespace = ? ORDER BY pl_title",
        )
        .bind(page_id)
        .bind(target_namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(title,)| title).collect())
    }
}
