//! Page property persistence

use crate::selection::{SelectionResult, PROP_NAME, PROP_NAME_FREE};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Replace the page-image properties of `page_id` with `selection`
///
/// Stale values from a previous selection are removed in the same
/// transaction.
pub async fn save_page_properties(pool: &SqlitePool, page_id: i64, selection: &SelectionResult) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM page_props WHERE pp_page = ? AND pp_propname IN (?, ?)")
        .bind(page_id)
        .bind(PROP_NAME_FREE)
        .bind(PROP_NAME)
        .execute(&mut *tx)
        .await?;

    let properties = selection.page_properties();
    for (name, value) in &properties {
        sqlx::query("INSERT INTO page_props (pp_page, pp_propname, pp_value) VALUES (?, ?, ?)")
            .bind(page_id)
            .bind(*name)
            .bind(value)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(page_id, count = properties.len(), "Saved page image properties");
    Ok(())
}

/// Page-image properties of `page_id`, ordered by name
pub async fn load_page_properties(pool: &SqlitePool, page_id: i64) -> Result<Vec<(String, String)>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT pp_propname, pp_value FROM page_props WHERE pp_page = ? AND pp_propname IN (?, ?) ORDER BY pp_propname",
    )
    .bind(page_id)
    .bind(PROP_NAME_FREE)
    .bind(PROP_NAME)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
