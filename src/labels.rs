//! Canonicalization of raw classifier label vocabularies.
//!
//! Pretrained sentiment models disagree on their output vocabulary: some
//! emit generic ordinals (`LABEL_0` / `LABEL_1` / `LABEL_2`), others textual
//! labels (`POSITIVE` / `NEGATIVE`). Aggregation assumes exactly the three
//! canonical labels, so every raw label passes through a [`LabelMap`].
//!
//! Resolution order:
//! 1. the explicit mapping table (built-in ordinal defaults, overridable via
//!    `[classifier.labels]` in config — the ordinal convention belongs to one
//!    model family and must stay configurable, not hard-coded);
//! 2. the generic ordinal pattern `LABEL_<n>`: 0 → Negative, 1 → Neutral,
//!    any other → Positive;
//! 3. a positive textual marker (`POS`, case-insensitive) → Positive;
//! 4. a negative textual marker (`NEG`, case-insensitive) → Negative;
//! 5. otherwise Neutral.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::models::Sentiment;

/// Raw-label to canonical-label mapping table.
#[derive(Debug, Clone)]
pub struct LabelMap {
    table: HashMap<String, Sentiment>,
}

impl Default for LabelMap {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert("LABEL_0".to_string(), Sentiment::Negative);
        table.insert("LABEL_1".to_string(), Sentiment::Neutral);
        table.insert("LABEL_2".to_string(), Sentiment::Positive);
        LabelMap { table }
    }
}

impl LabelMap {
    /// Build the map from config overrides, merged over the built-in
    /// defaults. Override values are validated at config load; unknown
    /// values still fail here rather than being dropped.
    pub fn from_overrides(overrides: &HashMap<String, String>) -> Result<LabelMap> {
        let mut map = LabelMap::default();
        for (raw, canonical) in overrides {
            match Sentiment::parse(canonical) {
                Some(label) => {
                    map.table.insert(raw.clone(), label);
                }
                None => bail!("unknown canonical label '{}' for '{}'", canonical, raw),
            }
        }
        Ok(map)
    }

    /// Map a raw model label onto the canonical taxonomy.
    pub fn canonical(&self, raw: &str) -> Sentiment {
        if let Some(label) = self.table.get(raw) {
            return *label;
        }

        if let Some(ordinal) = parse_ordinal(raw) {
            return match ordinal {
                0 => Sentiment::Negative,
                1 => Sentiment::Neutral,
                _ => Sentiment::Positive,
            };
        }

        let upper = raw.to_uppercase();
        if upper.contains("POS") {
            Sentiment::Positive
        } else if upper.contains("NEG") {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Parse the generic ordinal pattern `LABEL_<n>` (case-insensitive).
fn parse_ordinal(raw: &str) -> Option<u32> {
    let rest = raw
        .strip_prefix("LABEL_")
        .or_else(|| raw.strip_prefix("label_"))?;
    rest.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_defaults() {
        let map = LabelMap::default();
        assert_eq!(map.canonical("LABEL_0"), Sentiment::Negative);
        assert_eq!(map.canonical("LABEL_1"), Sentiment::Neutral);
        assert_eq!(map.canonical("LABEL_2"), Sentiment::Positive);
    }

    #[test]
    fn test_unlisted_ordinal_is_positive() {
        let map = LabelMap::default();
        assert_eq!(map.canonical("LABEL_3"), Sentiment::Positive);
        assert_eq!(map.canonical("label_7"), Sentiment::Positive);
    }

    #[test]
    fn test_textual_markers() {
        let map = LabelMap::default();
        assert_eq!(map.canonical("POSITIVE"), Sentiment::Positive);
        assert_eq!(map.canonical("NEGATIVE"), Sentiment::Negative);
        assert_eq!(map.canonical("positive"), Sentiment::Positive);
        assert_eq!(map.canonical("neg"), Sentiment::Negative);
    }

    #[test]
    fn test_unrecognized_is_neutral() {
        let map = LabelMap::default();
        assert_eq!(map.canonical("foo"), Sentiment::Neutral);
        assert_eq!(map.canonical(""), Sentiment::Neutral);
    }

    #[test]
    fn test_override_beats_ordinal_rule() {
        let mut overrides = HashMap::new();
        overrides.insert("LABEL_0".to_string(), "Positive".to_string());
        let map = LabelMap::from_overrides(&overrides).unwrap();
        assert_eq!(map.canonical("LABEL_0"), Sentiment::Positive);
        // Untouched defaults survive the merge
        assert_eq!(map.canonical("LABEL_2"), Sentiment::Positive);
        assert_eq!(map.canonical("LABEL_1"), Sentiment::Neutral);
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut overrides = HashMap::new();
        overrides.insert("LABEL_0".to_string(), "Sideways".to_string());
        assert!(LabelMap::from_overrides(&overrides).is_err());
    }
}
