//! Free-to-use classification of image files

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extended-metadata field marking a file as non-free
pub const NON_FREE_FIELD: &str = "NonFree";

/// A resolved file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
}

/// One extended-metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

pub type ExtendedMetadata = HashMap<String, MetadataField>;

/// File lookup and metadata extraction
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// `None` when no such file exists
    async fn resolve_file(&self, name: &str) -> Result<Option<FileHandle>>;

    async fn extended_metadata(&self, file: &FileHandle) -> Result<ExtendedMetadata>;
}

/// Answers whether a file is free to use
#[derive(Clone)]
pub struct FreenessOracle {
    repository: Arc<dyn FileRepository>,
}

impl FreenessOracle {
    pub fn new(repository: Arc<dyn FileRepository>) -> Self {
        Self { repository }
    }

    /// False only when the file's metadata carries a truthy non-free flag
    ///
    /// Files that cannot be resolved count as free, as do lookup failures.
    pub async fn is_free(&self, file_name: &str) -> bool {
        let file = match self.repository.resolve_file(file_name).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!(file = %file_name, "File not found, treating as free");
                return true;
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "File lookup failed, treating as free");
                return true;
            }
        };

        match self.repository.extended_metadata(&file).await {
            Ok(metadata) => !metadata
                .get(NON_FREE_FIELD)
                .map(|field| is_truthy(&field.value))
                .unwrap_or(false),
            Err(e) => {
                warn!(file = %file_name, error = %e, "Metadata lookup failed, treating as free");
                true
            }
        }
    }
}

/// Loose truthiness of a metadata value
fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !(s.is_empty() || s == "0"),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}
