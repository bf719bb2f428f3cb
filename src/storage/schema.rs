use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS drafts (
            video_id TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS draft_titles (
            video_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (video_id, position),
            FOREIGN KEY (video_id) REFERENCES drafts(video_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS draft_thumbnails (
            video_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            kind TEXT NOT NULL,
            timestamp REAL,
            PRIMARY KEY (video_id, position),
            FOREIGN KEY (video_id) REFERENCES drafts(video_id) ON DELETE CASCADE
        );
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}
