use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create posts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            author TEXT,
            created_at INTEGER NOT NULL,
            ingested_at INTEGER NOT NULL,
            lat REAL,
            lon REAL,
            target INTEGER,
            predicted_sentiment TEXT,
            analysis_meta TEXT,
            dedup_hash TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create FTS5 virtual table over post text
    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='posts_fts'",
    )
    .fetch_one(&pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE posts_fts USING fts5(
                post_id UNINDEXED,
                text
            )
            "#,
        )
        .execute(&pool)
        .await?;
    }

    // Create indexes: ascending over creation time for range scans, and a
    // best-effort plain index over the coordinate pair (SQLite has no
    // geospatial index; absence of geo data is tolerated).
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at ASC)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_sentiment ON posts(predicted_sentiment)")
        .execute(&pool)
        .await?;
    if let Err(e) = sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_geo ON posts(lat, lon)")
        .execute(&pool)
        .await
    {
        eprintln!("Warning: could not create geo index: {}", e);
    }

    pool.close().await;
    Ok(())
}
