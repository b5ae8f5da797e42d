//! Query-driven aggregate report.
//!
//! Builds every dashboard view from the orchestrator's output stream for
//! one query window: sentiment distribution, daily time series, word
//! frequencies, hashtag ranking, topic clusters, and sample posts. The
//! [`Report`] struct is built once and shared by the CLI renderer and the
//! HTTP API.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::analyze;
use crate::classifier::ClassifierChain;
use crate::config::Config;
use crate::db;
use crate::models::Sentiment;
use crate::topics::{self, Topic};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: String,
    pub days: i64,
    pub window_start: String,
    pub window_end: String,
    pub matched: usize,
    pub distribution: Vec<LabelCount>,
    pub timeline: Vec<DayCounts>,
    pub top_words: Vec<(String, u64)>,
    pub top_hashtags: Vec<(String, u64)>,
    pub topics: Vec<Topic>,
    pub samples: Vec<SamplePost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: Sentiment,
    pub count: u64,
    /// Share of matched posts, in percent.
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCounts {
    pub date: String,
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SamplePost {
    pub text: String,
    pub sentiment: Sentiment,
}

/// Number of sample posts included in a report.
const SAMPLE_COUNT: usize = 10;

/// Core report builder (used by CLI and server).
///
/// Fetches the query sample, runs each post through the cache-aware
/// orchestrator one at a time, then aggregates.
pub async fn build_report(
    config: &Config,
    pool: &SqlitePool,
    chain: &ClassifierChain,
    query: &str,
    days: i64,
    limit: i64,
) -> Result<Report> {
    analyze::validate_window(days, limit)?;

    let end = Utc::now();
    let start = end - Duration::days(days);

    let posts = crate::store::find_posts(
        pool,
        query,
        limit,
        Some(start.timestamp()),
        Some(end.timestamp()),
        None,
    )
    .await?;

    let mut labeled: Vec<(&crate::models::Post, Sentiment)> = Vec::with_capacity(posts.len());
    for post in &posts {
        let meta = analyze::analyze(pool, chain, &post.text, Some(&post.id), false).await?;
        labeled.push((post, meta.label));
    }

    let texts: Vec<String> = posts.iter().map(|p| p.text.clone()).collect();

    Ok(Report {
        query: query.to_string(),
        days,
        window_start: format_ts_iso(start),
        window_end: format_ts_iso(end),
        matched: posts.len(),
        distribution: distribution(&labeled),
        timeline: timeline(&labeled),
        top_words: word_frequencies(&texts, config.report.top_words),
        top_hashtags: hashtag_counts(&texts, config.report.top_hashtags),
        topics: if texts.len() >= topics::MIN_TEXTS {
            topics::topic_terms(&texts, config.report.topics, config.report.topic_terms)
        } else {
            Vec::new()
        },
        samples: labeled
            .iter()
            .take(SAMPLE_COUNT)
            .map(|(post, label)| SamplePost {
                text: post.text.clone(),
                sentiment: *label,
            })
            .collect(),
    })
}

/// CLI entry point — builds the report and prints it.
pub async fn run_report(config: &Config, query: &str, days: i64, limit: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let chain = ClassifierChain::from_config(&config.classifier)?;

    let report = build_report(config, &pool, &chain, query, days, limit).await?;
    print_report(&report);

    pool.close().await;
    Ok(())
}

fn distribution(labeled: &[(&crate::models::Post, Sentiment)]) -> Vec<LabelCount> {
    let mut counts: HashMap<Sentiment, u64> = HashMap::new();
    for (_, label) in labeled {
        *counts.entry(*label).or_insert(0) += 1;
    }

    let total = labeled.len() as f64;
    Sentiment::all()
        .iter()
        .map(|label| {
            let count = counts.get(label).copied().unwrap_or(0);
            let share = if total > 0.0 {
                (count as f64 * 1000.0 / total).round() / 10.0
            } else {
                0.0
            };
            LabelCount {
                label: *label,
                count,
                share,
            }
        })
        .collect()
}

fn timeline(labeled: &[(&crate::models::Post, Sentiment)]) -> Vec<DayCounts> {
    let mut by_day: HashMap<String, (u64, u64, u64)> = HashMap::new();

    for (post, label) in labeled {
        let date = DateTime::from_timestamp(post.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let entry = by_day.entry(date).or_insert((0, 0, 0));
        match label {
            Sentiment::Positive => entry.0 += 1,
            Sentiment::Negative => entry.1 += 1,
            Sentiment::Neutral => entry.2 += 1,
        }
    }

    let mut days: Vec<DayCounts> = by_day
        .into_iter()
        .map(|(date, (positive, negative, neutral))| DayCounts {
            date,
            positive,
            negative,
            neutral,
        })
        .collect();
    days.sort_by(|a, b| a.date.cmp(&b.date));
    days
}

/// Most frequent non-stopword terms across the sample, ties broken
/// lexicographically for stable output.
fn word_frequencies(texts: &[String], top_n: usize) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in texts {
        for token in topics::tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    ranked(counts, top_n)
}

fn hashtag_counts(texts: &[String], top_n: usize) -> Vec<(String, u64)> {
    // Unwrap is safe: the pattern is a literal.
    let hashtag = Regex::new(r"#(\w+)").unwrap();

    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in texts {
        for capture in hashtag.captures_iter(text) {
            let tag = capture[1].to_lowercase();
            *counts.entry(tag).or_insert(0) += 1;
        }
    }
    ranked(counts, top_n)
}

fn ranked(counts: HashMap<String, u64>, top_n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.truncate(top_n);
    entries
}

fn format_ts_iso(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn print_report(report: &Report) {
    println!("Social Pulse — Report");
    println!("=====================");
    println!();
    println!("  query:    \"{}\"", report.query);
    println!(
        "  window:   last {} days ({} .. {})",
        report.days, report.window_start, report.window_end
    );
    println!("  matched:  {} posts", report.matched);

    if report.matched == 0 {
        println!();
        println!("No posts matched the query window.");
        return;
    }

    println!();
    println!("  Sentiment distribution:");
    for entry in &report.distribution {
        let bar_len = (entry.share / 100.0 * 24.0).round() as usize;
        println!(
            "  {:<9} {:<24} {:>5}  ({:>5.1}%)",
            entry.label.as_str(),
            "#".repeat(bar_len),
            entry.count,
            entry.share
        );
    }

    if !report.timeline.is_empty() {
        println!();
        println!("  Daily sentiment:");
        println!("  {:<12} {:>8} {:>8} {:>8}", "DATE", "POS", "NEG", "NEU");
        for day in &report.timeline {
            println!(
                "  {:<12} {:>8} {:>8} {:>8}",
                day.date, day.positive, day.negative, day.neutral
            );
        }
    }

    if !report.top_words.is_empty() {
        println!();
        println!("  Top words:");
        for (word, count) in &report.top_words {
            println!("  {:<20} {:>6}", word, count);
        }
    }

    if !report.top_hashtags.is_empty() {
        println!();
        println!("  Top hashtags:");
        for (tag, count) in &report.top_hashtags {
            println!("  #{:<19} {:>6}", tag, count);
        }
    }

    if !report.topics.is_empty() {
        println!();
        println!("  Topics:");
        for (i, topic) in report.topics.iter().enumerate() {
            let terms: Vec<String> = topic
                .terms
                .iter()
                .map(|(term, weight)| format!("{} ({:.2})", term, weight))
                .collect();
            println!("  {}. {}", i + 1, terms.join(", "));
        }
    }

    if !report.samples.is_empty() {
        println!();
        println!("  Sample posts:");
        for sample in &report.samples {
            let text = sample.text.replace('\n', " ");
            let excerpt: String = text.chars().take(72).collect();
            println!("  [{:<8}] {}", sample.sentiment.as_str(), excerpt);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtag_extraction() {
        let texts = vec![
            "loving #rust and #Rust today".to_string(),
            "more #rust less #cpp".to_string(),
        ];
        let tags = hashtag_counts(&texts, 10);
        assert_eq!(tags[0], ("rust".to_string(), 3));
        assert_eq!(tags[1], ("cpp".to_string(), 1));
    }

    #[test]
    fn test_hashtag_none_found() {
        let texts = vec!["no tags here".to_string()];
        assert!(hashtag_counts(&texts, 10).is_empty());
    }

    #[test]
    fn test_word_frequencies_filter_stopwords() {
        let texts = vec![
            "the compiler is the compiler".to_string(),
            "compiler errors and the borrow checker".to_string(),
        ];
        let words = word_frequencies(&texts, 5);
        assert_eq!(words[0].0, "compiler");
        assert!(words.iter().all(|(w, _)| w != "the" && w != "and"));
    }

    #[test]
    fn test_ranked_ties_are_stable() {
        let mut counts = HashMap::new();
        counts.insert("beta".to_string(), 2u64);
        counts.insert("alpha".to_string(), 2u64);
        counts.insert("gamma".to_string(), 5u64);
        let top = ranked(counts, 3);
        assert_eq!(top[0].0, "gamma");
        assert_eq!(top[1].0, "alpha");
        assert_eq!(top[2].0, "beta");
    }
}
