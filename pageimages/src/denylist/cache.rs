//! Compute-once-per-key caches for the denylist
//!
//! Within a TTL window at most one caller recomputes a given key. Other
//! callers either wait for that recomputation or, for [`SqliteCache`],
//! receive the previous value while it is in flight.

use super::Denylist;
use crate::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[async_trait]
pub trait DenylistCache: Send + Sync {
    /// Cached value for `key`, or the result of `compute` stored for `ttl`
    ///
    /// `compute` is only awaited by the caller that wins the right to
    /// recompute. A failed computation is not cached.
    async fn get_or_compute<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        compute: BoxFuture<'a, Result<Denylist>>,
    ) -> Result<Arc<Denylist>>;
}

struct CachedEntry {
    value: Arc<Denylist>,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CachedEntry {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| at > Instant::now())
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<CachedEntry>>>;

/// In-process cache with one async mutex per key
#[derive(Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Drop the cached value for `key`
    pub async fn invalidate(&self, key: &str) {
        let slot = self.slot(key);
        *slot.lock().await = None;
    }
}

#[async_trait]
impl DenylistCache for MemoryCache {
    async fn get_or_compute<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        compute: BoxFuture<'a, Result<Denylist>>,
    ) -> Result<Arc<Denylist>> {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh() {
                return Ok(Arc::clone(&cached.value));
            }
        }

        debug!(key = %key, "Denylist cache miss, recomputing");
        let value = Arc::new(compute.await?);
        *entry = Some(CachedEntry {
            value: Arc::clone(&value),
            expires_at: Instant::now().checked_add(ttl),
        });
        Ok(value)
    }
}

/// Cross-process cache stored in the `objectcache` table
///
/// A lease column serializes recomputation across every process sharing
/// the database. Callers that lose the lease race return the stale value
/// when there is one, otherwise poll until the holder stores a fresh value
/// or its lease expires.
pub struct SqliteCache {
    pool: SqlitePool,
    lease: Duration,
    poll_interval: Duration,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            lease: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Maximum time a recomputation may hold the lease before others take over
    pub fn with_lease(mut self, lease: Duration, poll_interval: Duration) -> Self {
        self.lease = lease;
        self.poll_interval = poll_interval;
        self
    }

    /// `(value, expired)` for `key`, if a value has ever been stored
    async fn load(&self, key: &str, now: i64) -> Result<Option<(Denylist, bool)>> {
        let row = sqlx::query_as::<_, (Option<String>, i64)>(
            "SELECT value, exptime FROM objectcache WHERE keyname = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((Some(json), exptime)) => {
                let value: Denylist = serde_json::from_str(&json)?;
                Ok(Some((value, exptime <= now)))
            }
            _ => Ok(None),
        }
    }

    async fn try_acquire_lease(&self, key: &str, now: i64) -> Result<bool> {
        let lock_until = now.saturating_add(duration_millis(self.lease));
        let result = sqlx::query(
            r#"
            INSERT INTO objectcache (keyname, value, exptime, lock_until)
            VALUES (?1, NULL, 0, ?2)
            ON CONFLICT(keyname) DO UPDATE SET lock_until = excluded.lock_until
            WHERE objectcache.lock_until <= ?3
            "#,
        )
        .bind(key)
        .bind(lock_until)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn store(&self, key: &str, value: &Denylist, ttl: Duration) -> Result<()> {
        let exptime = now_millis().saturating_add(duration_millis(ttl));
        sqlx::query("UPDATE objectcache SET value = ?, exptime = ?, lock_until = 0 WHERE keyname = ?")
            .bind(serde_json::to_string(value)?)
            .bind(exptime)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<()> {
        sqlx::query("UPDATE objectcache SET lock_until = 0 WHERE keyname = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DenylistCache for SqliteCache {
    async fn get_or_compute<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        compute: BoxFuture<'a, Result<Denylist>>,
    ) -> Result<Arc<Denylist>> {
        loop {
            let now = now_millis();
            let stale = match self.load(key, now).await? {
                Some((value, false)) => return Ok(Arc::new(value)),
                Some((value, true)) => Some(value),
                None => None,
            };

            if self.try_acquire_lease(key, now).await? {
                // Another process may have stored a value since the first read
                if let Some((value, false)) = self.load(key, now_millis()).await? {
                    self.release(key).await?;
                    return Ok(Arc::new(value));
                }

                debug!(key = %key, "Acquired denylist recompute lease");
                return match compute.await {
                    Ok(value) => {
                        self.store(key, &value, ttl).await?;
                        Ok(Arc::new(value))
                    }
                    Err(e) => {
                        if let Err(release_err) = self.release(key).await {
                            warn!(key = %key, error = %release_err, "Failed to release denylist lease");
                        }
                        Err(e)
                    }
                };
            }

            if let Some(value) = stale {
                debug!(key = %key, "Recompute in flight elsewhere, serving stale denylist");
                return Ok(Arc::new(value));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Milliseconds in `duration`, clamped to the column range
fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
