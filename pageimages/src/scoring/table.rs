//! Ascending step-function score tables

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Ordered mapping from an ascending upper bound to a score
///
/// Entries are kept sorted by bound regardless of construction order.
/// A table always holds at least one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    entries: Vec<(f64, f64)>,
}

impl ScoreTable {
    /// Build a table from `(bound, score)` pairs in any order
    ///
    /// Returns `None` for an empty table.
    pub fn new<I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut entries: Vec<(f64, f64)> = entries.into_iter().collect();
        if entries.is_empty() {
            return None;
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Some(Self { entries })
    }

    /// Compiled-in tables; callers pass non-empty literals
    pub(crate) fn from_defaults(entries: &[(f64, f64)]) -> Self {
        let mut entries = entries.to_vec();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries }
    }

    /// Score of the first bound `>= value`, else the greatest bound's score
    pub fn evaluate(&self, value: f64) -> f64 {
        let mut last_score = 0.0;
        for &(bound, score) in &self.entries {
            if value <= bound {
                return score;
            }
            last_score = score;
        }
        last_score
    }

    /// Entries in ascending bound order
    pub fn entries(&self) -> &[(f64, f64)] {
        &self.entries
    }
}

/// Coerce a configured score to a number
///
/// Non-numeric values are a configuration defect but must not fail scoring.
pub(crate) fn coerce_score(key: &str, value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                warn!(bound = %key, value = %s, "Non-numeric score in score table, using 0");
                0.0
            }
        },
        other => {
            warn!(bound = %key, value = %other, "Non-numeric score in score table, using 0");
            0.0
        }
    }
}

impl<'de> Deserialize<'de> for ScoreTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // TOML keys are always strings, so bounds arrive as text
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in &raw {
            let bound = key
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("score table bound '{}' is not a number", key)))?;
            entries.push((bound, coerce_score(key, value)));
        }
        ScoreTable::new(entries).ok_or_else(|| de::Error::custom("score table must have at least one entry"))
    }
}

impl Serialize for ScoreTable {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (bound, score) in &self.entries {
            map.serialize_entry(&bound.to_string(), score)?;
        }
        map.end()
    }
}

/// Exact-key position scores; positions not listed contribute 0
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionScores {
    scores: BTreeMap<usize, f64>,
}

impl PositionScores {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        Self {
            scores: entries.into_iter().collect(),
        }
    }

    /// Score for the given on-page position
    pub fn score(&self, position: usize) -> f64 {
        self.scores.get(&position).copied().unwrap_or(0.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPositionScores {
    List(Vec<serde_json::Value>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl<'de> Deserialize<'de> for PositionScores {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let scores = match RawPositionScores::deserialize(deserializer)? {
            RawPositionScores::List(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (i, coerce_score(&i.to_string(), v)))
                .collect(),
            RawPositionScores::Map(map) => {
                let mut scores = BTreeMap::new();
                for (key, value) in &map {
                    let position = key.trim().parse::<usize>().map_err(|_| {
                        de::Error::custom(format!("position '{}' is not a non-negative integer", key))
                    })?;
                    scores.insert(position, coerce_score(key, value));
                }
                scores
            }
        };
        Ok(Self { scores })
    }
}

impl Serialize for PositionScores {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.scores.len()))?;
        for (position, score) in &self.scores {
            map.serialize_entry(&position.to_string(), score)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(f64, f64)]) -> ScoreTable {
        ScoreTable::new(entries.iter().copied()).unwrap()
    }

    #[test]
    fn test_evaluate_first_bound_at_or_above() {
        let t = table(&[(200.0, 1.0), (500.0, 5.0), (100000.0, 10.0)]);
        assert_eq!(t.evaluate(0.0), 1.0);
        assert_eq!(t.evaluate(200.0), 1.0);
        assert_eq!(t.evaluate(201.0), 5.0);
        assert_eq!(t.evaluate(600.0), 10.0);
    }

    #[test]
    fn test_evaluate_beyond_last_bound_uses_greatest() {
        let t = table(&[(3.0, -100.0), (5.0, 0.0), (20.0, 5.0), (30.0, 0.0), (31.0, -100.0)]);
        assert_eq!(t.evaluate(32.0), -100.0);
        assert_eq!(t.evaluate(1_000_000.0), -100.0);
    }

    #[test]
    fn test_construction_order_independent() {
        let a = table(&[(500.0, 5.0), (200.0, 1.0), (100000.0, 10.0)]);
        let b = table(&[(200.0, 1.0), (500.0, 5.0), (100000.0, 10.0)]);
        assert_eq!(a, b);
        assert_eq!(a.evaluate(300.0), 5.0);
    }

    #[test]
    fn test_monotonic_for_ascending_scores() {
        let t = table(&[(200.0, 1.0), (500.0, 3.0), (100000.0, 8.0)]);
        let mut previous = f64::MIN;
        for value in (0..2000).map(|v| v as f64 * 100.0) {
            let score = t.evaluate(value);
            assert!(score >= previous);
            previous = score;
        }
        assert_eq!(t.evaluate(100001.0), t.evaluate(5_000_000.0));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(ScoreTable::new(Vec::new()).is_none());
    }

    #[test]
    fn test_deserialize_from_toml_with_string_keys() {
        let t: ScoreTable = toml::from_str(r#"
            "600" = 5
            "119" = -100
            "400" = 10
        "#).unwrap();
        assert_eq!(t.entries(), &[(119.0, -100.0), (400.0, 10.0), (600.0, 5.0)]);
    }

    #[test]
    fn test_non_numeric_score_coerced_to_zero() {
        let t: ScoreTable = toml::from_str(r#"
            "10" = "lots"
            "20" = 4
        "#).unwrap();
        assert_eq!(t.evaluate(5.0), 0.0);
        assert_eq!(t.evaluate(15.0), 4.0);
    }

    #[test]
    fn test_non_numeric_bound_rejected() {
        let result: std::result::Result<ScoreTable, _> = toml::from_str(r#"wide = 4"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_position_scores_exact_key() {
        let p = PositionScores::new([(0, 2.0), (1, 1.0), (2, 0.0)]);
        assert_eq!(p.score(0), 2.0);
        assert_eq!(p.score(1), 1.0);
        assert_eq!(p.score(7), 0.0);
    }

    #[test]
    fn test_position_scores_from_list() {
        #[derive(Deserialize)]
        struct Wrapper {
            position: PositionScores,
        }
        let w: Wrapper = toml::from_str("position = [8, 6, 4, 3]").unwrap();
        assert_eq!(w.position.score(0), 8.0);
        assert_eq!(w.position.score(3), 3.0);
        assert_eq!(w.position.score(4), 0.0);
    }
}
