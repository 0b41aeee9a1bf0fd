//! Remote denylist source
//!
//! Fetches raw wikitext over HTTP and extracts `[[File:...]]` links.

use crate::names::normalize_file_name;
use crate::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("pageimages/", env!("CARGO_PKG_VERSION"));

/// Plain-text HTTP GET with a per-request timeout
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// [`HttpFetcher`] backed by reqwest
#[derive(Clone)]
pub struct ReqwestFetcher {
    http_client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Fetching remote denylist");

        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("{} returned {}", url, status.as_u16())));
        }

        response.text().await.map_err(|e| Error::Http(e.to_string()))
    }
}

/// Matches file-link markup for a fixed set of namespace aliases and extensions
#[derive(Debug, Clone)]
pub struct FileLinkExtractor {
    /// `None` when no alias or no extension is configured
    pattern: Option<Regex>,
}

impl FileLinkExtractor {
    pub fn new(namespace_aliases: &[String], extensions: &[String]) -> Result<Self> {
        if namespace_aliases.is_empty() || extensions.is_empty() {
            return Ok(Self { pattern: None });
        }
        let aliases = namespace_aliases
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");
        let extensions = extensions
            .iter()
            .map(|e| regex::escape(e.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"(?i)\[\[\s*:?\s*(?:{})\s*:\s*([^\[\]|#]+?\.(?:{}))\s*(?:[|#][^\]]*)?\]\]",
            aliases, extensions
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("invalid file link pattern: {}", e)))?;
        Ok(Self { pattern: Some(pattern) })
    }

    /// File names of every file link in `text` whose extension is allowed
    ///
    /// Names are returned normalized, in order of appearance.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| normalize_file_name(m.as_str()))
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> Vec<String> {
        vec!["File".to_string(), "Image".to_string()]
    }

    fn extensions() -> Vec<String> {
        vec!["png".to_string(), "jpg".to_string(), "svg".to_string()]
    }

    fn extract_file_links(text: &str, aliases: &[String], extensions: &[String]) -> Vec<String> {
        FileLinkExtractor::new(aliases, extensions).unwrap().extract(text)
    }

    #[test]
    fn test_extracts_plain_and_colon_links() {
        let text = "* [[:File:Foo bar.jpg]] is blocked\n* [[File:Baz.PNG|thumb|caption]]";
        assert_eq!(
            extract_file_links(text, &aliases(), &extensions()),
            vec!["Foo_bar.jpg".to_string(), "Baz.PNG".to_string()]
        );
    }

    #[test]
    fn test_namespace_alias_case_insensitive() {
        let text = "[[image:logo.svg]] and [[IMAGE: other.svg ]]";
        assert_eq!(
            extract_file_links(text, &aliases(), &extensions()),
            vec!["Logo.svg".to_string(), "Other.svg".to_string()]
        );
    }

    #[test]
    fn test_ignores_unlisted_extensions_and_pages() {
        let text = "[[File:Clip.ogg]] [[Main Page]] [[Category:Foo.jpg]] [[File:Doc.pdf|x]]";
        assert!(extract_file_links(text, &aliases(), &extensions()).is_empty());
    }

    #[test]
    fn test_section_fragment_stripped() {
        let text = "[[File:Map.png#top]]";
        assert_eq!(extract_file_links(text, &aliases(), &extensions()), vec!["Map.png".to_string()]);
    }

    #[test]
    fn test_oversized_pattern_is_config_error() {
        let aliases: Vec<String> = (0..100_000).map(|i| format!("{:0200}", i)).collect();
        let err = FileLinkExtractor::new(&aliases, &extensions()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_no_extensions_matches_nothing() {
        assert!(extract_file_links("[[File:A.jpg]]", &aliases(), &[]).is_empty());
    }
}

#[cfg(test)]
mod fetcher_tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection: read the request, then send `response` (or
    /// nothing, holding the socket open)
    async fn serve_once(response: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            match response {
                Some(response) => {
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(30)).await,
            }
        });
        format!("http://{}/denylist", addr)
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let url = serve_once(None).await;
        let fetcher = ReqwestFetcher::new().unwrap();

        let start = Instant::now();
        let result = fetcher.get(&url, Duration::from_millis(200)).await;

        assert!(matches!(result, Err(Error::Http(_))));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let url = serve_once(Some(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ))
        .await;
        let fetcher = ReqwestFetcher::new().unwrap();

        let result = fetcher.get(&url, Duration::from_secs(2)).await;

        match result {
            Err(Error::Http(message)) => assert!(message.contains("503")),
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let url = serve_once(Some(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 16\r\nConnection: close\r\n\r\n[[File:Bad.jpg]]",
        ))
        .await;
        let fetcher = ReqwestFetcher::new().unwrap();

        let body = fetcher.get(&url, Duration::from_secs(2)).await.unwrap();
        assert_eq!(body, "[[File:Bad.jpg]]");
    }
}
