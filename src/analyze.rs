//! Analysis orchestration.
//!
//! Ties the cache policy, classifier chain, and record store together:
//! per post, one cache check, at most one classification, at most one
//! write. Classification failures never surface here — the chain absorbs
//! them — while store failures propagate to the caller untouched.

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::cache;
use crate::classifier::ClassifierChain;
use crate::config::Config;
use crate::db;
use crate::models::{AnalysisMeta, Sentiment};
use crate::store;

/// Classify a text, reusing the stored result when it is still valid.
///
/// With a `post_id`, a valid cached record (same model version, not
/// forced) is returned as stored — no classification, no write. Otherwise
/// the chain runs and the fresh record overwrites the post's label and
/// metadata fields in a single update before being returned.
///
/// Without a `post_id` this is a pure classification: nothing is read or
/// written.
pub async fn analyze(
    pool: &SqlitePool,
    chain: &ClassifierChain,
    text: &str,
    post_id: Option<&str>,
    force: bool,
) -> Result<AnalysisMeta> {
    if let Some(id) = post_id {
        if !force {
            let cached = store::get_analysis_meta(pool, id).await?;
            if cache::should_reuse(cached.as_ref(), chain.model_version(), force) {
                if let Some(meta) = cached {
                    return Ok(meta);
                }
            }
        }
    }

    let meta = chain.classify(text).await?;

    if let Some(id) = post_id {
        store::save_analysis(pool, id, &meta).await?;
    }

    Ok(meta)
}

/// CLI entry point: analyze every post matching a query window, one post
/// at a time, and print a summary.
pub async fn run_analyze(
    config: &Config,
    query: &str,
    days: i64,
    limit: i64,
    geo: Option<store::GeoFilter>,
    force: bool,
) -> Result<()> {
    validate_window(days, limit)?;

    let pool = db::connect(config).await?;
    let chain = ClassifierChain::from_config(&config.classifier)?;

    let end = Utc::now();
    let start = end - Duration::days(days);

    let posts = store::find_posts(
        &pool,
        query,
        limit,
        Some(start.timestamp()),
        Some(end.timestamp()),
        geo.as_ref(),
    )
    .await?;

    let mut cache_hits = 0u64;
    let mut classified = 0u64;
    let mut counts: HashMap<Sentiment, u64> = HashMap::new();

    for post in &posts {
        let reusable = !force
            && cache::should_reuse(post.analysis_meta.as_ref(), chain.model_version(), force);

        let meta = analyze(&pool, &chain, &post.text, Some(&post.id), force).await?;

        if reusable {
            cache_hits += 1;
        } else {
            classified += 1;
        }
        *counts.entry(meta.label).or_insert(0) += 1;
    }

    println!("analyze \"{}\"", query);
    println!("  window: last {} days", days);
    println!("  matched: {} posts", posts.len());
    println!("  cache hits: {}", cache_hits);
    println!("  classified: {}", classified);
    for label in Sentiment::all() {
        println!("  {}: {}", label, counts.get(&label).copied().unwrap_or(0));
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Shared bounds for the query surface: day window and sample cap.
pub fn validate_window(days: i64, limit: i64) -> Result<()> {
    if !(1..=365).contains(&days) {
        bail!("days must be in [1, 365], got {}", days);
    }
    if !(50..=2000).contains(&limit) {
        bail!("limit must be in [50, 2000], got {}", limit);
    }
    Ok(())
}
