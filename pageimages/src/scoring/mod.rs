//! Candidate scoring
//!
//! A candidate's score is the sum of three step-function lookups (display
//! width, on-page position, aspect ratio). Denylisted files are forced to
//! [`DENYLISTED_SCORE`] so they can never win.

pub mod scorer;
pub mod table;

pub use scorer::{CandidateScorer, DENYLISTED_SCORE};
pub use table::{PositionScores, ScoreTable};

use serde::{Deserialize, Serialize};

/// The four tables used by [`CandidateScorer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Displayed width of images shown outside a gallery
    pub standalone_width: ScoreTable,
    /// Full width of images shown inside a gallery
    pub gallery_width: ScoreTable,
    /// Exact on-page position; positions not listed contribute 0
    pub position_index: PositionScores,
    /// `floor(width / height * 10)`
    pub aspect_ratio_tenths: ScoreTable,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            standalone_width: table(&[(119.0, -100.0), (400.0, 10.0), (600.0, 5.0), (601.0, 0.0)]),
            gallery_width: table(&[(99.0, -100.0), (100.0, 0.0)]),
            position_index: PositionScores::new([(0, 8.0), (1, 6.0), (2, 4.0), (3, 3.0)]),
            aspect_ratio_tenths: table(&[(3.0, -100.0), (5.0, 0.0), (20.0, 5.0), (30.0, 0.0), (31.0, -100.0)]),
        }
    }
}

fn table(entries: &[(f64, f64)]) -> ScoreTable {
    ScoreTable::from_defaults(entries)
}
