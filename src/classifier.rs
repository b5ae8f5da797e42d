//! Sentiment strategy abstraction and the two-tier classifier chain.
//!
//! Defines the [`SentimentStrategy`] trait and concrete implementations:
//! - **[`TransformerStrategy`]** — calls a hosted transformer sentiment
//!   model (Hugging Face inference API) configured by model id.
//! - **[`LexiconStrategy`]** — the embedded rule-based scorer from
//!   [`crate::vader`]; always available, total over all inputs.
//!
//! # Chain semantics
//!
//! Strategies are tried in order; the first `Ok` wins. A strategy failure
//! is absorbed silently — no retry, no partial result — and the next
//! strategy is invoked for that call only. The transformer may be absent
//! for the whole process lifetime (construction fails without an API
//! token); the lexicon scorer has no failure mode, so the chain always
//! produces a judgment, including for the empty string. Which tier
//! produced a result is observable only through the `model` field of the
//! returned metadata.
//!
//! Heavyweight classifiers can be missing, fail to load, or reject
//! edge-case input; the chain exists so that classification never fails
//! outright.
//!
//! # Model version
//!
//! [`MODEL_VERSION`] identifies the canonical labeling logic currently in
//! effect, independent of which strategy produced a given result. It is
//! stamped into every metadata record and is the cache validity key: bump
//! it when the labeling logic changes and all previously stored records
//! become stale on next access.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use crate::config::ClassifierConfig;
use crate::labels::LabelMap;
use crate::models::{AnalysisMeta, LexiconScores, RawOutput};
use crate::vader;

/// Version of the canonical labeling logic. Bump when the label mapping,
/// thresholds, or strategy roster changes in a way that should invalidate
/// previously cached results.
pub const MODEL_VERSION: &str = "1.0";

/// Raw judgment produced by a single strategy, before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutput {
    /// A model label plus confidence; needs the label canonicalizer.
    Labeled { raw_label: String, score: f64 },
    /// Lexicon component scores; labeled by the compound thresholds.
    Scored(LexiconScores),
}

/// One classification strategy in the chain.
#[async_trait]
pub trait SentimentStrategy: Send + Sync {
    /// Model identifier recorded in the metadata (e.g. the hub model id,
    /// or `"vader"` for the lexicon scorer).
    fn model(&self) -> &str;

    /// Produce a raw judgment for `text`. An `Err` makes the chain fall
    /// through to the next strategy for this call.
    async fn classify(&self, text: &str) -> Result<StrategyOutput>;
}

// ============ Transformer strategy ============

/// Primary strategy: a pretrained transformer sentiment model served by
/// the Hugging Face inference API.
///
/// Construction requires the `HF_API_TOKEN` environment variable; the
/// model id comes from config with an `HF_MODEL` environment override.
/// Invocation is a single attempt with a request timeout — transient
/// failures degrade to the next strategy rather than retrying.
pub struct TransformerStrategy {
    model: String,
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl TransformerStrategy {
    /// Create the strategy from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `HF_API_TOKEN` is not set or the HTTP client
    /// cannot be built; the caller treats this as the strategy being
    /// unavailable for the process lifetime.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let token = std::env::var("HF_API_TOKEN")
            .map_err(|_| anyhow!("HF_API_TOKEN environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.resolved_model(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }
}

#[async_trait]
impl SentimentStrategy for TransformerStrategy {
    fn model(&self) -> &str {
        &self.model
    }

    async fn classify(&self, text: &str) -> Result<StrategyOutput> {
        if text.trim().is_empty() {
            bail!("empty input");
        }

        let url = format!("{}/models/{}", self.endpoint, self.model);
        let body = serde_json::json!({ "inputs": text });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("inference API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let (raw_label, score) = top_candidate(&json)?;
        Ok(StrategyOutput::Labeled { raw_label, score })
    }
}

/// Extract the highest-confidence `(label, score)` pair from an inference
/// response. Accepts both the nested (`[[{label, score}, ...]]`) and flat
/// (`[{label, score}, ...]`) shapes the API produces.
fn top_candidate(json: &serde_json::Value) -> Result<(String, f64)> {
    let outer = json
        .as_array()
        .ok_or_else(|| anyhow!("invalid inference response: expected array"))?;

    let candidates = match outer.first() {
        Some(serde_json::Value::Array(inner)) => inner.as_slice(),
        Some(_) => outer.as_slice(),
        None => bail!("invalid inference response: empty array"),
    };

    let mut best: Option<(String, f64)> = None;
    for item in candidates {
        let label = item
            .get("label")
            .and_then(|l| l.as_str())
            .ok_or_else(|| anyhow!("invalid inference response: missing label"))?;
        let score = item.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);

        if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
            best = Some((label.to_string(), score));
        }
    }

    best.ok_or_else(|| anyhow!("invalid inference response: no candidates"))
}

// ============ Lexicon strategy ============

/// Fallback strategy: the embedded rule-based scorer. Parameter-free,
/// deterministic, and never fails.
pub struct LexiconStrategy;

#[async_trait]
impl SentimentStrategy for LexiconStrategy {
    fn model(&self) -> &str {
        "vader"
    }

    async fn classify(&self, text: &str) -> Result<StrategyOutput> {
        Ok(StrategyOutput::Scored(vader::polarity_scores(text)))
    }
}

// ============ Chain ============

/// Ordered strategy chain plus the label canonicalizer.
///
/// Constructed once at startup and shared by reference wherever
/// classification happens; the transformer's availability is decided at
/// construction and never re-probed.
pub struct ClassifierChain {
    strategies: Vec<Box<dyn SentimentStrategy>>,
    labels: LabelMap,
}

impl ClassifierChain {
    /// Build the chain from configuration: transformer first when it can
    /// be constructed, lexicon scorer always last.
    pub fn from_config(config: &ClassifierConfig) -> Result<ClassifierChain> {
        let labels = LabelMap::from_overrides(&config.labels)?;

        let mut strategies: Vec<Box<dyn SentimentStrategy>> = Vec::new();
        match TransformerStrategy::new(config) {
            Ok(t) => strategies.push(Box::new(t)),
            Err(e) => {
                eprintln!("Warning: transformer strategy unavailable ({}); using lexicon scorer", e);
            }
        }
        strategies.push(Box::new(LexiconStrategy));

        Ok(ClassifierChain { strategies, labels })
    }

    /// A chain with only the lexicon scorer. Useful offline and in tests.
    pub fn lexicon_only() -> ClassifierChain {
        ClassifierChain {
            strategies: vec![Box::new(LexiconStrategy)],
            labels: LabelMap::default(),
        }
    }

    pub fn model_version(&self) -> &'static str {
        MODEL_VERSION
    }

    /// Classify `text`, producing a complete metadata record.
    ///
    /// Strategies are tried in order; a failure falls through silently.
    /// With the lexicon scorer registered this cannot fail in practice.
    pub async fn classify(&self, text: &str) -> Result<AnalysisMeta> {
        for strategy in &self.strategies {
            match strategy.classify(text).await {
                Ok(output) => return Ok(self.build_meta(strategy.model(), output)),
                Err(_) => continue,
            }
        }
        bail!("no classification strategy produced a result")
    }

    fn build_meta(&self, model: &str, output: StrategyOutput) -> AnalysisMeta {
        let analyzed_at = Utc::now();
        match output {
            StrategyOutput::Labeled { raw_label, score } => AnalysisMeta {
                label: self.labels.canonical(&raw_label),
                raw: RawOutput::Label { raw_label },
                score,
                model: model.to_string(),
                model_version: MODEL_VERSION.to_string(),
                analyzed_at,
            },
            StrategyOutput::Scored(scores) => AnalysisMeta {
                label: vader::label_for_compound(scores.compound),
                score: scores.compound,
                raw: RawOutput::Scores { raw_scores: scores },
                model: model.to_string(),
                model_version: MODEL_VERSION.to_string(),
                analyzed_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    /// Strategy that always fails, standing in for a broken transformer.
    struct FailingStrategy;

    #[async_trait]
    impl SentimentStrategy for FailingStrategy {
        fn model(&self) -> &str {
            "broken"
        }
        async fn classify(&self, _text: &str) -> Result<StrategyOutput> {
            bail!("boom")
        }
    }

    /// Strategy returning a fixed labeled output.
    struct StubStrategy {
        raw_label: &'static str,
        score: f64,
    }

    #[async_trait]
    impl SentimentStrategy for StubStrategy {
        fn model(&self) -> &str {
            "stub-transformer"
        }
        async fn classify(&self, _text: &str) -> Result<StrategyOutput> {
            Ok(StrategyOutput::Labeled {
                raw_label: self.raw_label.to_string(),
                score: self.score,
            })
        }
    }

    fn chain_with(strategies: Vec<Box<dyn SentimentStrategy>>) -> ClassifierChain {
        ClassifierChain {
            strategies,
            labels: LabelMap::default(),
        }
    }

    #[tokio::test]
    async fn test_failing_primary_falls_through_to_lexicon() {
        let chain = chain_with(vec![Box::new(FailingStrategy), Box::new(LexiconStrategy)]);
        let meta = chain.classify("I love this!!!").await.unwrap();
        assert_eq!(meta.model, "vader");
        assert_eq!(meta.label, Sentiment::Positive);
        assert_eq!(meta.model_version, MODEL_VERSION);
    }

    #[tokio::test]
    async fn test_primary_output_is_canonicalized() {
        let chain = chain_with(vec![
            Box::new(StubStrategy {
                raw_label: "LABEL_2",
                score: 0.87,
            }),
            Box::new(LexiconStrategy),
        ]);
        let meta = chain.classify("whatever").await.unwrap();
        assert_eq!(meta.label, Sentiment::Positive);
        assert_eq!(meta.score, 0.87);
        assert_eq!(meta.model, "stub-transformer");
        assert_eq!(meta.model_version, MODEL_VERSION);
        assert_eq!(
            meta.raw,
            RawOutput::Label {
                raw_label: "LABEL_2".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_text_lexicon_is_neutral() {
        let chain = ClassifierChain::lexicon_only();
        let meta = chain.classify("").await.unwrap();
        assert_eq!(meta.label, Sentiment::Neutral);
        assert_eq!(meta.model, "vader");
        assert_eq!(meta.score, 0.0);
        match meta.raw {
            RawOutput::Scores { raw_scores } => assert_eq!(raw_scores.compound, 0.0),
            _ => panic!("expected lexicon scores"),
        }
    }

    #[tokio::test]
    async fn test_label_domain_is_total() {
        let chain = ClassifierChain::lexicon_only();
        for text in ["", "meh", "I love this!!!", "this is awful", "???!!!"] {
            let meta = chain.classify(text).await.unwrap();
            assert!(Sentiment::all().contains(&meta.label));
        }
    }

    #[test]
    fn test_top_candidate_nested_shape() {
        let json = serde_json::json!([[
            {"label": "LABEL_0", "score": 0.02},
            {"label": "LABEL_2", "score": 0.87},
            {"label": "LABEL_1", "score": 0.11}
        ]]);
        let (label, score) = top_candidate(&json).unwrap();
        assert_eq!(label, "LABEL_2");
        assert!((score - 0.87).abs() < 1e-9);
    }

    #[test]
    fn test_top_candidate_flat_shape() {
        let json = serde_json::json!([
            {"label": "POSITIVE", "score": 0.99},
            {"label": "NEGATIVE", "score": 0.01}
        ]);
        let (label, _) = top_candidate(&json).unwrap();
        assert_eq!(label, "POSITIVE");
    }

    #[test]
    fn test_top_candidate_rejects_garbage() {
        assert!(top_candidate(&serde_json::json!({"error": "loading"})).is_err());
        assert!(top_candidate(&serde_json::json!([])).is_err());
        assert!(top_candidate(&serde_json::json!([{"score": 0.5}])).is_err());
    }
}
