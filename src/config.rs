use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::Sentiment;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Primary model identifier on the inference hub.
    #[serde(default = "default_model")]
    pub model: String,
    /// Inference API base URL. Overridable for self-hosted endpoints.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Explicit raw-label overrides, merged over the built-in ordinal table.
    /// Values must be one of Positive, Negative, Neutral.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            labels: HashMap::new(),
        }
    }
}

impl ClassifierConfig {
    /// Model id with the `HF_MODEL` environment override applied.
    pub fn resolved_model(&self) -> String {
        std::env::var("HF_MODEL")
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.model.clone())
    }
}

fn default_model() -> String {
    "cardiffnlp/twitter-roberta-base-sentiment".to_string()
}
fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_days")]
    pub default_days: i64,
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    #[serde(default = "default_top_words")]
    pub top_words: usize,
    #[serde(default = "default_top_hashtags")]
    pub top_hashtags: usize,
    #[serde(default = "default_topics")]
    pub topics: usize,
    #[serde(default = "default_topic_terms")]
    pub topic_terms: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            default_limit: default_limit(),
            top_words: default_top_words(),
            top_hashtags: default_top_hashtags(),
            topics: default_topics(),
            topic_terms: default_topic_terms(),
        }
    }
}

fn default_days() -> i64 {
    30
}
fn default_limit() -> i64 {
    500
}
fn default_top_words() -> usize {
    20
}
fn default_top_hashtags() -> usize {
    20
}
fn default_topics() -> usize {
    5
}
fn default_topic_terms() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7878".to_string()
}

impl Config {
    /// Minimal in-memory config for commands that can run without a config
    /// file on disk (e.g. `pulse classify`).
    pub fn minimal() -> Config {
        Config {
            db: DbConfig {
                path: PathBuf::from("./data/pulse.sqlite"),
            },
            classifier: ClassifierConfig::default(),
            report: ReportConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate classifier
    if config.classifier.timeout_secs == 0 {
        anyhow::bail!("classifier.timeout_secs must be > 0");
    }

    for (raw, canonical) in &config.classifier.labels {
        if Sentiment::parse(canonical).is_none() {
            anyhow::bail!(
                "classifier.labels: '{}' maps to unknown label '{}'. Must be Positive, Negative, or Neutral.",
                raw,
                canonical
            );
        }
    }

    // Validate report defaults against the query surface bounds
    if !(1..=365).contains(&config.report.default_days) {
        anyhow::bail!("report.default_days must be in [1, 365]");
    }
    if !(50..=2000).contains(&config.report.default_limit) {
        anyhow::bail!("report.default_limit must be in [50, 2000]");
    }
    if config.report.topics == 0 || config.report.topic_terms == 0 {
        anyhow::bail!("report.topics and report.topic_terms must be > 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_defaults_applied() {
        let f = write_config("[db]\npath = \"/tmp/pulse.sqlite\"\n");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.classifier.model, "cardiffnlp/twitter-roberta-base-sentiment");
        assert_eq!(cfg.report.default_days, 30);
        assert_eq!(cfg.report.default_limit, 500);
        assert_eq!(cfg.server.bind, "127.0.0.1:7878");
    }

    #[test]
    fn test_bad_label_mapping_rejected() {
        let f = write_config(
            "[db]\npath = \"/tmp/pulse.sqlite\"\n\n[classifier.labels]\nLABEL_0 = \"Sad\"\n",
        );
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_out_of_range_report_defaults_rejected() {
        let f = write_config("[db]\npath = \"/tmp/p.sqlite\"\n\n[report]\ndefault_days = 500\n");
        assert!(load_config(f.path()).is_err());
    }
}
