//! CSV ingestion.
//!
//! Reads a posts dump into the store. The primary format is the
//! Sentiment140 layout — headerless `target, id, date, flag, user, text`
//! rows in Latin-1 — but any file whose rows carry fewer columns is
//! treated as one text per row. Re-ingesting the same file is safe: the
//! store deduplicates on content.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::models::NewPost;
use crate::store;

pub async fn run_ingest(config: &Config, csv_path: &Path, limit: Option<usize>) -> Result<()> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut posts: Vec<NewPost> = Vec::new();
    let mut skipped_rows = 0usize;

    for record in reader.byte_records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                skipped_rows += 1;
                continue;
            }
        };

        let fields: Vec<String> = record.iter().map(decode_field).collect();
        posts.push(row_to_post(&fields));

        if let Some(lim) = limit {
            if posts.len() >= lim {
                break;
            }
        }
    }

    let pool = db::connect(config).await?;
    let inserted = store::insert_posts(&pool, &posts).await?;
    let duplicates = posts.len() as u64 - inserted;

    println!("ingest {}", csv_path.display());
    println!("  rows parsed: {}", posts.len());
    if skipped_rows > 0 {
        println!("  rows skipped (malformed): {}", skipped_rows);
    }
    println!("  inserted: {}", inserted);
    println!("  duplicates skipped: {}", duplicates);
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Map one CSV row onto a post. Six or more columns is the Sentiment140
/// layout; anything narrower is a bare text row.
fn row_to_post(fields: &[String]) -> NewPost {
    if fields.len() >= 6 {
        NewPost {
            text: fields[5].clone(),
            author: non_empty(&fields[4]),
            created_at: parse_created_at(&fields[2]).unwrap_or_else(Utc::now),
            lat: None,
            lon: None,
            target: fields[0].trim().parse::<i64>().ok(),
        }
    } else {
        NewPost {
            text: fields.first().cloned().unwrap_or_default(),
            author: None,
            created_at: Utc::now(),
            lat: None,
            lon: None,
            target: None,
        }
    }
}

/// Decode a CSV field as UTF-8, falling back to Latin-1 (every byte is a
/// valid Latin-1 code point, so this never fails).
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the Sentiment140 timestamp format (`Mon Apr 06 22:19:45 PDT
/// 2009`, zone name ignored, treated as UTC), with ISO-ish fallbacks.
fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Drop the zone-name token, which chrono cannot resolve to an offset.
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() == 6 {
        let without_zone = format!(
            "{} {} {} {} {}",
            tokens[0], tokens[1], tokens[2], tokens[3], tokens[5]
        );
        if let Ok(naive) = NaiveDateTime::parse_from_str(&without_zone, "%a %b %d %H:%M:%S %Y") {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentiment140_timestamp() {
        let dt = parse_created_at("Mon Apr 06 22:19:45 PDT 2009").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2009-04-06 22:19:45");
    }

    #[test]
    fn test_parse_iso_fallbacks() {
        assert!(parse_created_at("2024-01-15T10:30:00Z").is_some());
        assert!(parse_created_at("2024-01-15 10:30:00").is_some());
        assert!(parse_created_at("not a date").is_none());
        assert!(parse_created_at("").is_none());
    }

    #[test]
    fn test_row_to_post_sentiment140_layout() {
        let fields: Vec<String> = [
            "0",
            "1467810369",
            "Mon Apr 06 22:19:45 PDT 2009",
            "NO_QUERY",
            "some_user",
            "this layout is such a mess",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let post = row_to_post(&fields);
        assert_eq!(post.text, "this layout is such a mess");
        assert_eq!(post.author.as_deref(), Some("some_user"));
        assert_eq!(post.target, Some(0));
        assert_eq!(post.created_at.format("%Y").to_string(), "2009");
    }

    #[test]
    fn test_row_to_post_bare_text() {
        let fields = vec!["just one column".to_string()];
        let post = row_to_post(&fields);
        assert_eq!(post.text, "just one column");
        assert!(post.author.is_none());
        assert!(post.target.is_none());
    }

    #[test]
    fn test_decode_field_latin1() {
        // 0xE9 is 'é' in Latin-1 but invalid standalone UTF-8
        assert_eq!(decode_field(&[0x63, 0x61, 0x66, 0xE9]), "café");
        assert_eq!(decode_field("plain".as_bytes()), "plain");
    }
}
