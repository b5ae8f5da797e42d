//! Classification cache validity policy.
//!
//! The sole mechanism preventing redundant reclassification, and the sole
//! mechanism by which a model-version bump forces reanalysis: stale records
//! are detected lazily on next access, never swept eagerly.

use crate::models::AnalysisMeta;

/// Decide whether a cached classification record may be reused.
///
/// True iff `force` is false, a record exists, and its `model_version`
/// matches the current one. Pure decision function; no side effects.
pub fn should_reuse(cached: Option<&AnalysisMeta>, current_version: &str, force: bool) -> bool {
    if force {
        return false;
    }
    matches!(cached, Some(meta) if meta.model_version == current_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawOutput, Sentiment};
    use chrono::Utc;

    fn meta(version: &str) -> AnalysisMeta {
        AnalysisMeta {
            label: Sentiment::Neutral,
            raw: RawOutput::Label {
                raw_label: "LABEL_1".to_string(),
            },
            score: 0.5,
            model: "test-model".to_string(),
            model_version: version.to_string(),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_reuse_on_version_match() {
        let m = meta("1.0");
        assert!(should_reuse(Some(&m), "1.0", false));
    }

    #[test]
    fn test_no_reuse_without_cache() {
        assert!(!should_reuse(None, "1.0", false));
    }

    #[test]
    fn test_no_reuse_on_version_mismatch() {
        let m = meta("1.0");
        assert!(!should_reuse(Some(&m), "1.1", false));
    }

    #[test]
    fn test_force_bypasses_valid_cache() {
        let m = meta("1.0");
        assert!(!should_reuse(Some(&m), "1.0", true));
    }
}
