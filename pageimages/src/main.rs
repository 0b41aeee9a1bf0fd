//! pageimages - lead image selection from the command line
//!
//! Reads image candidates (JSON, in page order), resolves the configured
//! denylist and prints the selected page images.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pageimages::config::load_config;
use pageimages::db::{self, SqliteFileRepository, SqliteLinkStore};
use pageimages::denylist::{DenylistCache, LinkStore, MemoryCache, ReqwestFetcher, SqliteCache};
use pageimages::freeness::{ExtendedMetadata, FileHandle, FileRepository};
use pageimages::{
    compute_selection, CandidateScorer, DenylistResolver, FreenessOracle, ImageCandidate, PageImagesConfig,
    SelectionResult,
};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "pageimages", version, about = "Select representative images for content pages")]
struct Cli {
    /// Config file (defaults to $PAGEIMAGES_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database with pages, links, files and page properties
    #[arg(long, global = true, env = "PAGEIMAGES_DATABASE")]
    database: Option<PathBuf>,

    /// Log filter, overrides the config file (RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score candidates and print the selection as JSON
    Select {
        /// JSON array of image candidates in page order
        #[arg(long)]
        candidates: PathBuf,

        /// Persist the selection as properties of this page
        #[arg(long)]
        page_id: Option<i64>,

        /// Namespace of the page when no --page-id is given
        #[arg(long, default_value_t = 0)]
        namespace: i64,
    },
    /// Print the resolved denylist
    Denylist,
}

/// Repository used when no database is given: every file is unknown
struct NoFiles;

#[async_trait::async_trait]
impl FileRepository for NoFiles {
    async fn resolve_file(&self, _name: &str) -> pageimages::Result<Option<FileHandle>> {
        Ok(None)
    }

    async fn extended_metadata(&self, _file: &FileHandle) -> pageimages::Result<ExtendedMetadata> {
        Ok(ExtendedMetadata::new())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_filter = init_tracing(cli.log_level.as_deref());
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(handle) = log_filter {
        handle.reload(EnvFilter::new(&config.logging.level))?;
    }

    info!("pageimages {}", env!("CARGO_PKG_VERSION"));

    let pool = match &cli.database {
        Some(path) => Some(db::init_database(path).await?),
        None => None,
    };

    let resolver = build_resolver(&config, pool.as_ref())?;

    match cli.command {
        Command::Select {
            candidates,
            page_id,
            namespace,
        } => {
            let namespace = match (page_id, &pool) {
                (Some(page_id), Some(pool)) => db::page_namespace(pool, page_id).await?,
                (Some(_), None) => anyhow::bail!("--page-id requires --database"),
                (None, _) => namespace,
            };
            if !config.should_process(namespace) {
                info!(namespace, "Namespace not configured for page images, skipping");
                println!("{}", serde_json::to_string_pretty(&SelectionResult::default())?);
                return Ok(());
            }
            let candidates = read_candidates(&candidates)?;
            let denylist = resolver.resolve().await?;

            let repository: Arc<dyn FileRepository> = match &pool {
                Some(pool) => Arc::new(SqliteFileRepository::new(pool.clone())),
                None => Arc::new(NoFiles),
            };
            let oracle = FreenessOracle::new(repository);
            let scorer = CandidateScorer::new(config.scores.clone());

            let selection = compute_selection(&candidates, &scorer, &denylist, &oracle).await;
            println!("{}", serde_json::to_string_pretty(&selection)?);

            if let (Some(page_id), Some(pool)) = (page_id, &pool) {
                db::save_page_properties(pool, page_id, &selection).await?;
            }
        }
        Command::Denylist => {
            let denylist = resolver.resolve().await?;
            for name in denylist.sorted() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber before anything logs
///
/// Returns a handle for applying the config file's level when neither
/// `RUST_LOG` nor `--log-level` chose one.
fn init_tracing(cli_level: Option<&str>) -> Option<FilterHandle> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (directives, from_config) = initial_filter(rust_log.as_deref(), cli_level);
    let (filter, handle) = reload::Layer::new(EnvFilter::new(directives));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    from_config.then_some(handle)
}

/// Startup filter directives, and whether the config file may replace them
fn initial_filter<'a>(rust_log: Option<&'a str>, cli_level: Option<&'a str>) -> (&'a str, bool) {
    match (rust_log, cli_level) {
        (Some(directives), _) => (directives, false),
        (None, Some(level)) => (level, false),
        (None, None) => ("info", true),
    }
}

fn build_resolver(config: &PageImagesConfig, pool: Option<&SqlitePool>) -> Result<DenylistResolver> {
    let fetcher = Arc::new(ReqwestFetcher::new()?);
    let mut links: Option<Arc<dyn LinkStore>> = None;
    let mut cache: Arc<dyn DenylistCache> = Arc::new(MemoryCache::new());
    if let Some(pool) = pool {
        links = Some(Arc::new(SqliteLinkStore::new(pool.clone())));
        cache = Arc::new(SqliteCache::new(pool.clone()));
    }
    Ok(DenylistResolver::new(config, links, fetcher, cache)?)
}

fn read_candidates(path: &Path) -> Result<Vec<ImageCandidate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates from {}", path.display()))?;
    let candidates: Vec<ImageCandidate> =
        serde_json::from_str(&content).with_context(|| format!("Invalid candidates JSON in {}", path.display()))?;
    Ok(candidates)
}
