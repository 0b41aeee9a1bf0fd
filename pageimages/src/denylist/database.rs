//! Database-backed denylist source
//!
//! The blocked names are the file links of a configured page.

use crate::names::{parse_page_locator, NS_FILE};
use crate::Result;
use async_trait::async_trait;

/// Outbound-link query against the page store
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Titles linked from the page identified by `namespace` + `title`,
    /// restricted to `target_namespace`
    ///
    /// Returns an empty list when the page does not exist.
    async fn links_from(&self, namespace: i64, title: &str, target_namespace: i64) -> Result<Vec<String>>;
}

/// File names linked from the page at `locator` (e.g. `MediaWiki:Bad image list`)
pub async fn file_links(store: &dyn LinkStore, locator: &str) -> Result<Vec<String>> {
    let (namespace, title) = parse_page_locator(locator);
    store.links_from(namespace, &title, NS_FILE).await
}
