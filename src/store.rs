//! Record store operations over the posts database.
//!
//! The store is a keyed record collection with full-text search, inclusive
//! time-range filtering, projection reads, a targeted two-field update for
//! classification results, and batched inserts. It is the only module that
//! touches the `posts` tables directly.

use anyhow::Result;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{AnalysisMeta, NewPost, Post, Sentiment};

/// Radius filter around a point.
#[derive(Debug, Clone, Copy)]
pub struct GeoFilter {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
}

/// Fetch posts matching a query within an inclusive time window, capped at
/// `limit`.
///
/// An empty (or token-free) query means unfiltered. The geo filter is a
/// bounding-box prefilter in SQL followed by an exact great-circle check,
/// so it never over-returns; posts without coordinates are excluded when a
/// geo filter is given.
pub async fn find_posts(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
    start: Option<i64>,
    end: Option<i64>,
    geo: Option<&GeoFilter>,
) -> Result<Vec<Post>> {
    let match_expr = fts_match_expr(query);

    let mut sql = String::from(
        "SELECT p.id, p.text, p.author, p.created_at, p.lat, p.lon, \
         p.predicted_sentiment, p.analysis_meta FROM posts p",
    );
    if match_expr.is_some() {
        sql.push_str(" JOIN posts_fts ON posts_fts.post_id = p.id");
    }
    sql.push_str(" WHERE p.created_at >= ? AND p.created_at <= ?");
    if match_expr.is_some() {
        sql.push_str(" AND posts_fts MATCH ?");
    }
    if geo.is_some() {
        sql.push_str(
            " AND p.lat IS NOT NULL AND p.lon IS NOT NULL \
             AND p.lat BETWEEN ? AND ? AND p.lon BETWEEN ? AND ?",
        );
    }
    sql.push_str(" ORDER BY p.created_at DESC, p.id ASC LIMIT ?");

    let mut q = sqlx::query(&sql)
        .bind(start.unwrap_or(i64::MIN))
        .bind(end.unwrap_or(i64::MAX));
    if let Some(ref expr) = match_expr {
        q = q.bind(expr.clone());
    }
    if let Some(g) = geo {
        let (lat_lo, lat_hi, lon_lo, lon_hi) = bounding_box(g);
        q = q.bind(lat_lo).bind(lat_hi).bind(lon_lo).bind(lon_hi);
    }
    q = q.bind(limit);

    let rows = q.fetch_all(pool).await?;

    let mut posts = Vec::with_capacity(rows.len());
    for row in &rows {
        let sentiment: Option<String> = row.get("predicted_sentiment");
        let meta_json: Option<String> = row.get("analysis_meta");

        let post = Post {
            id: row.get("id"),
            text: row.get("text"),
            author: row.get("author"),
            created_at: row.get("created_at"),
            lat: row.get("lat"),
            lon: row.get("lon"),
            predicted_sentiment: sentiment.as_deref().and_then(Sentiment::parse),
            analysis_meta: meta_json.as_deref().and_then(parse_meta),
        };

        if let Some(g) = geo {
            match (post.lat, post.lon) {
                (Some(lat), Some(lon)) if haversine_km(g.lat, g.lon, lat, lon) <= g.radius_km => {}
                _ => continue,
            }
        }

        posts.push(post);
    }

    Ok(posts)
}

/// Projection read of a post's classification metadata.
pub async fn get_analysis_meta(pool: &SqlitePool, id: &str) -> Result<Option<AnalysisMeta>> {
    let meta_json: Option<Option<String>> =
        sqlx::query_scalar("SELECT analysis_meta FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(meta_json.flatten().as_deref().and_then(parse_meta))
}

/// Persist a classification result: one atomic overwrite of the label
/// field and the full metadata record. Replaces any prior record entirely.
pub async fn save_analysis(pool: &SqlitePool, id: &str, meta: &AnalysisMeta) -> Result<()> {
    let meta_json = serde_json::to_string(meta)?;

    sqlx::query("UPDATE posts SET predicted_sentiment = ?, analysis_meta = ? WHERE id = ?")
        .bind(meta.label.as_str())
        .bind(meta_json)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert a batch of posts in one transaction, assigning identities.
///
/// Duplicate records (same text, author, and timestamp) are skipped via
/// the dedup hash, so re-ingesting a file is safe. Returns the number of
/// rows actually inserted.
pub async fn insert_posts(pool: &SqlitePool, posts: &[NewPost]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let now = chrono::Utc::now().timestamp();
    let mut inserted = 0u64;

    for post in posts {
        let id = Uuid::new_v4().to_string();
        let created = post.created_at.timestamp();
        let dedup = dedup_hash(&post.text, post.author.as_deref(), created);

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO posts
                (id, text, author, created_at, ingested_at, lat, lon, target, dedup_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&post.text)
        .bind(&post.author)
        .bind(created)
        .bind(now)
        .bind(post.lat)
        .bind(post.lon)
        .bind(post.target)
        .bind(&dedup)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 1 {
            sqlx::query("INSERT INTO posts_fts (post_id, text) VALUES (?, ?)")
                .bind(&id)
                .bind(&post.text)
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

/// A record that fails to parse is treated as absent: the cache policy
/// then triggers reclassification, which overwrites it.
fn parse_meta(json: &str) -> Option<AnalysisMeta> {
    serde_json::from_str(json).ok()
}

/// Build an FTS5 MATCH expression from free text. Each token is quoted so
/// user input (hashtags, apostrophes, operators) cannot break the MATCH
/// syntax. Returns `None` when no searchable token remains.
fn fts_match_expr(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .filter_map(|tok| {
            let cleaned: String = tok.chars().filter(|c| c.is_alphanumeric()).collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(format!("\"{}\"", cleaned))
            }
        })
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn dedup_hash(text: &str, author: Option<&str>, created_at: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    hasher.update(author.unwrap_or("").as_bytes());
    hasher.update(created_at.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Degree-space bounding box around a geo filter, slightly generous so the
/// exact distance check makes the final call.
fn bounding_box(g: &GeoFilter) -> (f64, f64, f64, f64) {
    let dlat = g.radius_km / 111.0;
    let cos_lat = g.lat.to_radians().cos().abs().max(0.01);
    let dlon = g.radius_km / (111.0 * cos_lat);
    (g.lat - dlat, g.lat + dlat, g.lon - dlon, g.lon + dlon)
}

/// Great-circle distance in kilometers.
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fts_expr_quotes_tokens() {
        assert_eq!(
            fts_match_expr("rust lang"),
            Some("\"rust\" \"lang\"".to_string())
        );
    }

    #[test]
    fn test_fts_expr_strips_operators_and_hashtags() {
        assert_eq!(fts_match_expr("#rust"), Some("\"rust\"".to_string()));
        assert_eq!(
            fts_match_expr("don't \"panic\""),
            Some("\"dont\" \"panic\"".to_string())
        );
        assert_eq!(fts_match_expr("NOT AND*"), Some("\"NOT\" \"AND\"".to_string()));
    }

    #[test]
    fn test_fts_expr_empty_means_unfiltered() {
        assert_eq!(fts_match_expr(""), None);
        assert_eq!(fts_match_expr("   "), None);
        assert_eq!(fts_match_expr("!!! ???"), None);
    }

    #[test]
    fn test_haversine_known_distance() {
        // London to Paris is roughly 344 km
        let d = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 344.0).abs() < 10.0, "distance = {}", d);
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let d = haversine_km(40.0, -74.0, 40.0, -74.0);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let g = GeoFilter {
            lat: 40.0,
            lon: -74.0,
            radius_km: 50.0,
        };
        let (lat_lo, lat_hi, lon_lo, lon_hi) = bounding_box(&g);
        assert!(lat_lo < 40.0 && lat_hi > 40.0);
        assert!(lon_lo < -74.0 && lon_hi > -74.0);
        // A point at the radius edge due north stays inside the box
        assert!(lat_hi >= 40.0 + 50.0 / 111.0);
    }

    #[test]
    fn test_dedup_hash_sensitivity() {
        let a = dedup_hash("hello", Some("alice"), 100);
        assert_eq!(a, dedup_hash("hello", Some("alice"), 100));
        assert_ne!(a, dedup_hash("hello", Some("bob"), 100));
        assert_ne!(a, dedup_hash("hello", Some("alice"), 101));
        assert_ne!(a, dedup_hash("hello!", Some("alice"), 100));
    }
}
