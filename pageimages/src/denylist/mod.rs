//! Denylist resolution
//!
//! Merges blocked file names from every configured source into one set,
//! memoized behind a [`DenylistCache`] so the sources are consulted at most
//! once per TTL window for a given cache key.

pub mod cache;
pub mod database;
pub mod remote;

pub use cache::{DenylistCache, MemoryCache, SqliteCache};
pub use database::LinkStore;
pub use remote::{FileLinkExtractor, HttpFetcher, ReqwestFetcher};

use crate::config::{DenylistConfig, PageImagesConfig};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Set of file names that may never be chosen as a page image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denylist {
    names: HashSet<String>,
}

impl Denylist {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.names.contains(file_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in lexical order, for display
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Where a source's blocked names come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DenylistSourceKind {
    /// File links of a page in the local database
    Database,
    /// File-link markup in raw text fetched over HTTP
    RemoteUrl,
    /// Anything else; rejected when the denylist is recomputed
    Unknown(String),
}

impl From<String> for DenylistSourceKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "database" | "db" => DenylistSourceKind::Database,
            "remote-url" | "url" => DenylistSourceKind::RemoteUrl,
            _ => DenylistSourceKind::Unknown(kind),
        }
    }
}

impl From<DenylistSourceKind> for String {
    fn from(kind: DenylistSourceKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for DenylistSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenylistSourceKind::Database => write!(f, "database"),
            DenylistSourceKind::RemoteUrl => write!(f, "remote-url"),
            DenylistSourceKind::Unknown(kind) => write!(f, "{}", kind),
        }
    }
}

/// One configured denylist source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenylistSource {
    pub kind: DenylistSourceKind,
    /// Page locator (`database`) or URL (`remote-url`)
    pub locator: String,
}

impl DenylistSource {
    pub fn database(locator: impl Into<String>) -> Self {
        Self {
            kind: DenylistSourceKind::Database,
            locator: locator.into(),
        }
    }

    pub fn remote_url(locator: impl Into<String>) -> Self {
        Self {
            kind: DenylistSourceKind::RemoteUrl,
            locator: locator.into(),
        }
    }
}

/// Resolves the merged denylist through a shared cache
pub struct DenylistResolver {
    config: DenylistConfig,
    file_links: FileLinkExtractor,
    links: Option<Arc<dyn LinkStore>>,
    fetcher: Arc<dyn HttpFetcher>,
    cache: Arc<dyn DenylistCache>,
}

impl DenylistResolver {
    /// `links` may be omitted when no `database` source is configured
    pub fn new(
        config: &PageImagesConfig,
        links: Option<Arc<dyn LinkStore>>,
        fetcher: Arc<dyn HttpFetcher>,
        cache: Arc<dyn DenylistCache>,
    ) -> Result<Self> {
        Ok(Self {
            config: config.denylist.clone(),
            file_links: FileLinkExtractor::new(&config.file_namespace_aliases, &config.file_extensions)?,
            links,
            fetcher,
            cache,
        })
    }

    /// Current denylist, recomputing it if the cached copy has expired
    pub async fn resolve(&self) -> Result<Arc<Denylist>> {
        if self.config.sources.is_empty() {
            return Ok(Arc::new(Denylist::default()));
        }
        self.cache
            .get_or_compute(&self.config.cache_key, self.config.ttl(), Box::pin(self.recompute()))
            .await
    }

    /// Consult every source in configured order, bypassing the cache
    ///
    /// Unavailable sources contribute nothing. An unrecognized source kind
    /// aborts the whole computation.
    pub async fn recompute(&self) -> Result<Denylist> {
        let mut names = Vec::new();
        for source in &self.config.sources {
            let found = match &source.kind {
                DenylistSourceKind::Database => self.database_names(&source.locator).await?,
                DenylistSourceKind::RemoteUrl => self.remote_names(&source.locator).await,
                DenylistSourceKind::Unknown(kind) => {
                    return Err(Error::Config(format!(
                        "unrecognized denylist source kind '{}' for '{}'",
                        kind, source.locator
                    )));
                }
            };
            info!(kind = %source.kind, locator = %source.locator, count = found.len(), "Loaded denylist source");
            names.extend(found);
        }

        let denylist = Denylist::from_names(names);
        info!(count = denylist.len(), "Denylist recomputed");
        Ok(denylist)
    }

    async fn database_names(&self, locator: &str) -> Result<Vec<String>> {
        let links = self.links.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "database denylist source '{}' configured without a link store",
                locator
            ))
        })?;
        match database::file_links(links.as_ref(), locator).await {
            Ok(names) => Ok(names),
            Err(e) => {
                warn!(locator = %locator, error = %e, "Denylist database source unavailable");
                Ok(Vec::new())
            }
        }
    }

    async fn remote_names(&self, url: &str) -> Vec<String> {
        match self.fetcher.get(url, self.config.fetch_timeout()).await {
            Ok(text) => self.file_links.extract(&text),
            Err(e) => {
                warn!(url = %url, error = %e, "Denylist remote source unavailable");
                Vec::new()
            }
        }
    }
}
