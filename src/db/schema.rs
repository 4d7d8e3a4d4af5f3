//! Database row types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct ScanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub total_issues: i64,
    /// JSON-encoded issue list
    pub issues: String,
    pub score: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub page_title: String,
    pub page_description: String,
}
