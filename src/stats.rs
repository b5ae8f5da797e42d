//! Database statistics and health overview.
//!
//! A quick summary of what's stored: post counts, analysis coverage, the
//! label breakdown, and the covered time range. Used by `pulse stats` to
//! give confidence that ingestion and analysis are working as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::models::Sentiment;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await?;

    let analyzed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE predicted_sentiment IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Social Pulse — Database Stats");
    println!("=============================");
    println!();
    println!("  Database:   {}", config.db.path.display());
    println!("  Size:       {}", format_bytes(db_size));
    println!();
    println!("  Posts:      {}", total_posts);
    println!(
        "  Analyzed:   {} / {} ({}%)",
        analyzed,
        total_posts,
        if total_posts > 0 {
            (analyzed * 100) / total_posts
        } else {
            0
        }
    );

    // Label breakdown
    let label_rows = sqlx::query(
        r#"
        SELECT predicted_sentiment AS label, COUNT(*) AS count
        FROM posts
        WHERE predicted_sentiment IS NOT NULL
        GROUP BY predicted_sentiment
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !label_rows.is_empty() {
        println!();
        println!("  By label:");
        for label in Sentiment::all() {
            let count = label_rows
                .iter()
                .find(|row| row.get::<String, _>("label") == label.as_str())
                .map(|row| row.get::<i64, _>("count"))
                .unwrap_or(0);
            println!("  {:<10} {:>8}", label.as_str(), count);
        }
    }

    // Covered time range
    if total_posts > 0 {
        let range_row = sqlx::query(
            "SELECT MIN(created_at) AS earliest, MAX(created_at) AS latest FROM posts",
        )
        .fetch_one(&pool)
        .await?;

        let earliest: i64 = range_row.get("earliest");
        let latest: i64 = range_row.get("latest");

        println!();
        println!("  Earliest:   {}", format_ts_iso(earliest));
        println!("  Latest:     {}", format_ts_iso(latest));
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
