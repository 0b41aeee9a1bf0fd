//! Aggregation by file name and best-image selection
//!
//! Ties are broken by first appearance on the page, so aggregation keeps
//! file names in first-insertion order.

use crate::candidate::ImageCandidate;
use crate::denylist::Denylist;
use crate::freeness::FreenessOracle;
use crate::scoring::CandidateScorer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Page property holding the best free image
pub const PROP_NAME_FREE: &str = "page_image_free";

/// Page property holding the best image when it differs from the free one
pub const PROP_NAME: &str = "page_image";

/// Maximum score per file name, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredCandidates {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl ScoredCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score, keeping the maximum seen for `file_name`
    pub fn record(&mut self, file_name: &str, score: f64) {
        match self.index.get(file_name) {
            Some(&i) => {
                let best = &mut self.entries[i].1;
                if score > *best {
                    *best = score;
                }
            }
            None => {
                self.index.insert(file_name.to_string(), self.entries.len());
                self.entries.push((file_name.to_string(), score));
            }
        }
    }

    pub fn get(&self, file_name: &str) -> Option<f64> {
        self.index.get(file_name).map(|&i| self.entries[i].1)
    }

    /// `(file_name, score)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Score every candidate at its on-page position and fold by normalized
/// file name
pub fn aggregate(candidates: &[ImageCandidate], scorer: &CandidateScorer, denylist: &Denylist) -> ScoredCandidates {
    let mut scored = ScoredCandidates::new();
    for (position, candidate) in candidates.iter().enumerate() {
        let score = scorer.score(candidate, position, denylist);
        scored.record(&candidate.key(), score);
    }
    scored
}

/// Winners for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub best_overall: Option<String>,
    pub best_free: Option<String>,
}

impl SelectionResult {
    /// Properties to persist
    ///
    /// The free image is always written when present. The overall winner is
    /// only written when it differs from the free one.
    pub fn page_properties(&self) -> Vec<(&'static str, String)> {
        let mut properties = Vec::with_capacity(2);
        if let Some(free) = &self.best_free {
            properties.push((PROP_NAME_FREE, free.clone()));
        }
        if let Some(best) = &self.best_overall {
            if self.best_free.as_ref() != Some(best) {
                properties.push((PROP_NAME, best.clone()));
            }
        }
        properties
    }

    pub fn is_empty(&self) -> bool {
        self.best_overall.is_none() && self.best_free.is_none()
    }
}

/// Pick the best-scoring file and the best-scoring free file
///
/// Only positive scores qualify. A later file must score strictly higher to
/// replace an earlier one. Freeness is only checked for files that would
/// otherwise take the free slot.
pub async fn select(scored: &ScoredCandidates, oracle: &FreenessOracle) -> SelectionResult {
    let mut result = SelectionResult::default();
    let mut best_score = 0.0;
    let mut free_score = 0.0;

    for (file_name, score) in scored.iter() {
        if score > best_score {
            best_score = score;
            result.best_overall = Some(file_name.to_string());
        }
        if score > free_score && oracle.is_free(file_name).await {
            free_score = score;
            result.best_free = Some(file_name.to_string());
        }
    }

    debug!(
        best = ?result.best_overall,
        best_score,
        free = ?result.best_free,
        free_score,
        "Selected page images"
    );
    result
}

/// Score, aggregate and select in one call
pub async fn compute_selection(
    candidates: &[ImageCandidate],
    scorer: &CandidateScorer,
    denylist: &Denylist,
    oracle: &FreenessOracle,
) -> SelectionResult {
    let scored = aggregate(candidates, scorer, denylist);
    select(&scored, oracle).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_max_and_first_order() {
        let mut scored = ScoredCandidates::new();
        scored.record("A.jpg", 3.0);
        scored.record("B.jpg", 5.0);
        scored.record("A.jpg", 9.0);
        scored.record("B.jpg", 1.0);

        let entries: Vec<_> = scored.iter().collect();
        assert_eq!(entries, vec![("A.jpg", 9.0), ("B.jpg", 5.0)]);
        assert_eq!(scored.get("B.jpg"), Some(5.0));
        assert_eq!(scored.get("C.jpg"), None);
    }

    #[test]
    fn test_properties_when_same_winner() {
        let result = SelectionResult {
            best_overall: Some("A.jpg".to_string()),
            best_free: Some("A.jpg".to_string()),
        };
        assert_eq!(result.page_properties(), vec![(PROP_NAME_FREE, "A.jpg".to_string())]);
    }

    #[test]
    fn test_properties_when_winners_differ() {
        let result = SelectionResult {
            best_overall: Some("Poster.jpg".to_string()),
            best_free: Some("Photo.jpg".to_string()),
        };
        assert_eq!(
            result.page_properties(),
            vec![
                (PROP_NAME_FREE, "Photo.jpg".to_string()),
                (PROP_NAME, "Poster.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn test_properties_non_free_only() {
        let result = SelectionResult {
            best_overall: Some("Poster.jpg".to_string()),
            best_free: None,
        };
        assert_eq!(result.page_properties(), vec![(PROP_NAME, "Poster.jpg".to_string())]);
    }

    #[test]
    fn test_properties_empty() {
        assert!(SelectionResult::default().page_properties().is_empty());
        assert!(SelectionResult::default().is_empty());
    }
}
