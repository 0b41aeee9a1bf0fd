//! SQLite storage collaborators
//!
//! Page, link, file and page-property tables plus the shared object cache.

pub mod files;
pub mod links;
pub mod props;

pub use files::SqliteFileRepository;
pub use links::SqliteLinkStore;
pub use props::{load_page_properties, save_page_properties};

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database at `db_path` and ensure tables exist
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Journal mode and busy timeout apply to every pooled connection
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;
    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page (
            page_id INTEGER PRIMARY KEY AUTOINCREMENT,
            page_namespace INTEGER NOT NULL,
            page_title TEXT NOT NULL,
            UNIQUE (page_namespace, page_title)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pagelinks (
            pl_from INTEGER NOT NULL,
            pl_namespace INTEGER NOT NULL,
            pl_title TEXT NOT NULL,
            PRIMARY KEY (pl_from, pl_namespace, pl_title)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS image (
            img_name TEXT PRIMARY KEY,
            img_width INTEGER NOT NULL DEFAULT 0,
            img_height INTEGER NOT NULL DEFAULT 0,
            img_metadata TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page_props (
            pp_page INTEGER NOT NULL,
            pp_propname TEXT NOT NULL,
            pp_value TEXT NOT NULL,
            PRIMARY KEY (pp_page, pp_propname)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS objectcache (
            keyname TEXT PRIMARY KEY,
            value TEXT,
            exptime INTEGER NOT NULL DEFAULT 0,
            lock_until INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a page if missing and return its id
pub async fn ensure_page(pool: &SqlitePool, namespace: i64, title: &str) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO page (page_namespace, page_title) VALUES (?, ?)")
        .bind(namespace)
        .bind(title)
        .execute(pool)
        .await?;

    let (page_id,) = sqlx::query_as::<_, (i64,)>(
        "SELECT page_id FROM page WHERE page_namespace = ? AND page_title = ?",
    )
    .bind(namespace)
    .bind(title)
    .fetch_one(pool)
    .await?;
    Ok(page_id)
}

/// Namespace of an existing page
pub async fn page_namespace(pool: &SqlitePool, page_id: i64) -> Result<i64> {
    let row = sqlx::query_as::<_, (i64,)>("SELECT page_namespace FROM page WHERE page_id = ?")
        .bind(page_id)
        .fetch_optional(pool)
        .await?;
    row.map(|(namespace,)| namespace)
        .ok_or_else(|| Error::NotFound(format!("page {}", page_id)))
}
