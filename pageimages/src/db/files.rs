//! File records and their extended metadata

use crate::freeness::{ExtendedMetadata, FileHandle, FileRepository};
use crate::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::warn;

/// [`FileRepository`] over the `image` table
///
/// `img_metadata` holds a JSON object of `field -> {value, source}`.
#[derive(Clone)]
pub struct SqliteFileRepository {
    pool: SqlitePool,
}

impl SqliteFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a file record
    pub async fn upsert_file(&self, name: &str, width: u32, height: u32, metadata: &ExtendedMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO image (img_name, img_width, img_height, img_metadata)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(img_name) DO UPDATE SET
                img_width = excluded.img_width,
                img_height = excluded.img_height,
                img_metadata = excluded.img_metadata
            "#,
        )
        .bind(name)
        .bind(width as i64)
        .bind(height as i64)
        .bind(serde_json::to_string(metadata)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FileRepository for SqliteFileRepository {
    async fn resolve_file(&self, name: &str) -> Result<Option<FileHandle>> {
        let row = sqlx::query_as::<_, (String,)>("SELECT img_name FROM image WHERE img_name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(name,)| FileHandle { name }))
    }

    async fn extended_metadata(&self, file: &FileHandle) -> Result<ExtendedMetadata> {
        let row = sqlx::query_as::<_, (String,)>("SELECT img_metadata FROM image WHERE img_name = ?")
            .bind(&file.name)
            .fetch_optional(&self.pool)
            .await?;

        let Some((json,)) = row else {
            return Ok(ExtendedMetadata::new());
        };
        match serde_json::from_str(&json) {
            Ok(metadata) => Ok(metadata),
            Err(e) => {
                warn!(file = %file.name, error = %e, "Unreadable file metadata");
                Ok(ExtendedMetadata::new())
            }
        }
    }
}
