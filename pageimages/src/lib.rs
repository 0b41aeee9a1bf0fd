//! # Page Images
//!
//! Picks a representative lead image for a content page:
//! - Score tables and per-candidate scoring
//! - Denylist resolution from database and remote sources, behind a
//!   compute-once-per-TTL cache
//! - Aggregation by file name and best-overall / best-free selection
//! - SQLite-backed storage collaborators and configuration loading

pub mod candidate;
pub mod config;
pub mod db;
pub mod denylist;
pub mod error;
pub mod freeness;
pub mod names;
pub mod scoring;
pub mod selection;

pub use candidate::ImageCandidate;
pub use config::PageImagesConfig;
pub use denylist::{Denylist, DenylistResolver, DenylistSource, DenylistSourceKind};
pub use error::{Error, Result};
pub use freeness::{FileRepository, FreenessOracle};
pub use scoring::{CandidateScorer, ScoreConfig, ScoreTable, DENYLISTED_SCORE};
pub use selection::{compute_selection, SelectionResult, PROP_NAME, PROP_NAME_FREE};
