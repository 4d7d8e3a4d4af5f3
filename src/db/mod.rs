//! Database pool and migrations

pub mod schema;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              BLOB PRIMARY KEY,
    username        TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,
    bio             TEXT NOT NULL DEFAULT '',
    photo_url       TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scans (
    id               BLOB PRIMARY KEY,
    user_id          BLOB NOT NULL REFERENCES users(id),
    url              TEXT NOT NULL,
    total_issues     INTEGER NOT NULL DEFAULT 0,
    issues           TEXT NOT NULL DEFAULT '[]',
    score            INTEGER NOT NULL DEFAULT 0,
    status           TEXT NOT NULL DEFAULT 'pending',
    created_at       TEXT NOT NULL,
    duration_ms      INTEGER NOT NULL DEFAULT 0,
    page_title       TEXT NOT NULL DEFAULT 'Unknown',
    page_description TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_scans_user_created ON scans(user_id, created_at)
"#;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    info!("Connected to database");
    Ok(pool)
}

/// Apply the embedded schema. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement).execute(pool).await?;
        }
    }
    Ok(())
}
