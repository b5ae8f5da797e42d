//! Core data models used throughout Social Pulse.
//!
//! These types represent the posts, classification metadata, and raw
//! strategy outputs that flow through the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical three-way sentiment taxonomy.
///
/// Every strategy output is mapped onto this fixed vocabulary before it
/// reaches aggregation; downstream views assume exactly these three labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    pub fn parse(s: &str) -> Option<Sentiment> {
        match s {
            "Positive" => Some(Sentiment::Positive),
            "Negative" => Some(Sentiment::Negative),
            "Neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    /// All labels in a fixed display order.
    pub fn all() -> [Sentiment; 3] {
        [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral]
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component scores produced by the lexicon scorer.
///
/// `neg`/`neu`/`pos` are proportions in [0, 1]; `compound` is the
/// normalized aggregate valence in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// Strategy-specific raw payload, opaque to downstream consumers.
///
/// Serialized flattened into [`AnalysisMeta`], so the persisted record
/// carries either a `raw_label` key (transformer) or a `raw_scores` key
/// (lexicon), never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOutput {
    Label { raw_label: String },
    Scores { raw_scores: LexiconScores },
}

/// The result of one classification run.
///
/// Immutable once created; superseded whole (never merged) when a post is
/// reclassified. `model_version` is the cache validity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub label: Sentiment,
    #[serde(flatten)]
    pub raw: RawOutput,
    pub score: f64,
    pub model: String,
    pub model_version: String,
    pub analyzed_at: DateTime<Utc>,
}

/// A social post as stored in SQLite.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: Option<String>,
    pub created_at: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub predicted_sentiment: Option<Sentiment>,
    pub analysis_meta: Option<AnalysisMeta>,
}

/// A post as produced by ingestion, before the store assigns an identity.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Label column carried through from the source CSV, if present.
    pub target: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_json_shape_transformer() {
        let meta = AnalysisMeta {
            label: Sentiment::Positive,
            raw: RawOutput::Label {
                raw_label: "LABEL_2".to_string(),
            },
            score: 0.87,
            model: "cardiffnlp/twitter-roberta-base-sentiment".to_string(),
            model_version: "1.0".to_string(),
            analyzed_at: Utc::now(),
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["label"], "Positive");
        assert_eq!(json["raw_label"], "LABEL_2");
        assert!(json.get("raw_scores").is_none());

        let back: AnalysisMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_meta_json_shape_lexicon() {
        let meta = AnalysisMeta {
            label: Sentiment::Neutral,
            raw: RawOutput::Scores {
                raw_scores: LexiconScores {
                    neg: 0.0,
                    neu: 1.0,
                    pos: 0.0,
                    compound: 0.0,
                },
            },
            score: 0.0,
            model: "vader".to_string(),
            model_version: "1.0".to_string(),
            analyzed_at: Utc::now(),
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["raw_scores"]["compound"], 0.0);
        assert!(json.get("raw_label").is_none());

        let back: AnalysisMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_sentiment_roundtrip() {
        for s in Sentiment::all() {
            assert_eq!(Sentiment::parse(s.as_str()), Some(s));
        }
        assert_eq!(Sentiment::parse("positive"), None);
    }
}
