//! Test doubles for the storage, HTTP and file collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use pageimages::denylist::{HttpFetcher, LinkStore};
use pageimages::freeness::{ExtendedMetadata, FileHandle, FileRepository, MetadataField, NON_FREE_FIELD};
use pageimages::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Link store answering from a fixed map of `title -> file names`
#[derive(Default)]
pub struct CountingLinkStore {
    pages: HashMap<String, Vec<String>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl CountingLinkStore {
    pub fn with_page(title: &str, files: &[&str]) -> Self {
        let mut pages = HashMap::new();
        pages.insert(title.to_string(), files.iter().map(|f| f.to_string()).collect());
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Sleep before answering, to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkStore for CountingLinkStore {
    async fn links_from(&self, _namespace: i64, title: &str, _target_namespace: i64) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.pages.get(title).cloned().unwrap_or_default())
    }
}

/// How a [`CountingFetcher`] responds
pub enum FetchBehavior {
    Body(String),
    /// Waits out the caller's timeout, then fails like a timed-out request
    Timeout,
    Fail,
}

pub struct CountingFetcher {
    behavior: FetchBehavior,
    pub calls: AtomicUsize,
    pub last_timeout: std::sync::Mutex<Option<Duration>>,
}

impl CountingFetcher {
    pub fn new(behavior: FetchBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_timeout: std::sync::Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpFetcher for CountingFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_timeout.lock().unwrap() = Some(timeout);
        match &self.behavior {
            FetchBehavior::Body(text) => Ok(text.clone()),
            FetchBehavior::Timeout => Err(Error::Http(format!("{} timed out after {:?}", url, timeout))),
            FetchBehavior::Fail => Err(Error::Http(format!("{} returned 503", url))),
        }
    }
}

/// File repository over an in-memory map; names absent from the map do not exist
#[derive(Default)]
pub struct MapFileRepository {
    files: HashMap<String, ExtendedMetadata>,
    pub lookups: AtomicUsize,
}

impl MapFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn free(mut self, name: &str) -> Self {
        self.files.insert(name.to_string(), ExtendedMetadata::new());
        self
    }

    pub fn non_free(mut self, name: &str) -> Self {
        self.files.insert(name.to_string(), non_free_metadata());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileRepository for MapFileRepository {
    async fn resolve_file(&self, name: &str) -> Result<Option<FileHandle>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.contains_key(name).then(|| FileHandle {
            name: name.to_string(),
        }))
    }

    async fn extended_metadata(&self, file: &FileHandle) -> Result<ExtendedMetadata> {
        Ok(self.files.get(&file.name).cloned().unwrap_or_default())
    }
}

pub fn non_free_metadata() -> ExtendedMetadata {
    let mut metadata = ExtendedMetadata::new();
    metadata.insert(
        NON_FREE_FIELD.to_string(),
        MetadataField {
            value: serde_json::json!("1"),
            source: Some("file-page".to_string()),
        },
    );
    metadata
}

/// Fresh on-disk database with all tables
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = pageimages::db::init_database(&temp_dir.path().join("pageimages.db"))
        .await
        .unwrap();
    (temp_dir, pool)
}
