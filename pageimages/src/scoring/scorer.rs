//! Per-candidate composite score

use super::ScoreConfig;
use crate::candidate::ImageCandidate;
use crate::denylist::Denylist;
use tracing::debug;

/// Score assigned to denylisted files regardless of their other facts
pub const DENYLISTED_SCORE: f64 = -1000.0;

/// Scores candidates against a fixed [`ScoreConfig`]
#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    config: ScoreConfig,
}

impl CandidateScorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Composite score of `candidate` appearing at `position` on the page
    pub fn score(&self, candidate: &ImageCandidate, position: usize, denylist: &Denylist) -> f64 {
        let key = candidate.key();
        if denylist.contains(&key) {
            debug!(file = %key, position, "Candidate is denylisted");
            return DENYLISTED_SCORE;
        }

        let width_score = match candidate.effective_standalone_width() {
            Some(width) => self.config.standalone_width.evaluate(width as f64),
            None => self.config.gallery_width.evaluate(candidate.full_width as f64),
        };
        let position_score = self.config.position_index.score(position);
        let ratio_score = self
            .config
            .aspect_ratio_tenths
            .evaluate(candidate.aspect_ratio_tenths() as f64);

        let total = width_score + position_score + ratio_score;
        debug!(
            file = %key,
            position,
            width_score,
            position_score,
            ratio_score,
            total,
            "Scored image candidate"
        );
        total
    }
}
