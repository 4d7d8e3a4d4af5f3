//! Scan management routes

use crate::auth::AuthUser;
use crate::db::schema::ScanRow;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateScanRequest, ScanListResponse, ScanResponse, ScanStatus, ScanSummary,
};
use crate::scanner::metadata::fetch_page_metadata;
use crate::scanner::normalize::normalize_issues;
use crate::scanner::score::score_issues;
use crate::scanner::{EngineError, ScanOptions};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const MAX_PAGE: i64 = 1_000_000;
const DEFAULT_LOOKBACK_DAYS: i64 = 30;
// Ten years; chrono::Duration::days panics far past this
const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub days: Option<i64>,
}

fn validate_url(raw: &str) -> ApiResult<Url> {
    if raw.is_empty() {
        return Err(ApiError::Validation("url is required".to_string()));
    }
    let url = Url::parse(raw).map_err(|_| ApiError::Validation("url is not valid".to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ApiError::Validation(
            "url must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

fn parse_scan_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("invalid scan id".to_string()))
}

pub async fn create_scan(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateScanRequest>,
) -> ApiResult<Json<ScanResponse>> {
    let url = validate_url(&req.url)?;
    let options = ScanOptions::new(req.scan_type, req.device_type);

    info!("Starting scan of {} for user {}", url, user.user_id);
    let started = Instant::now();

    let report = match state.engine.scan(url.as_str(), &options).await {
        Ok(report) => report,
        Err(e) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            record_failed_scan(&state, user.user_id, url.as_str(), duration_ms).await;
            return Err(match e {
                EngineError::Timeout(secs) => {
                    ApiError::ScanTimeout(format!("no result within {secs} seconds"))
                }
                EngineError::UnresolvedHost => ApiError::UnresolvedHost(url.to_string()),
                other => ApiError::ScanFailed(other.to_string()),
            });
        }
    };

    let issues = normalize_issues(&report.issues);
    let score = score_issues(&issues);

    // Optional enrichment, never fatal
    let mut meta = fetch_page_metadata(&state.http, url.as_str()).await;
    if let Some(title) = report.document_title.filter(|t| !t.is_empty()) {
        meta.title = title;
    }

    let duration_ms = started.elapsed().as_millis() as i64;
    let issues_json = serde_json::to_string(&issues)
        .map_err(|e| ApiError::Internal(format!("issue serialization failed: {e}")))?;

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO scans (id, user_id, url, total_issues, issues, score, status, created_at, duration_ms, page_title, page_description)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(user.user_id)
    .bind(url.as_str())
    .bind(issues.len() as i64)
    .bind(&issues_json)
    .bind(score)
    .bind(ScanStatus::Completed.as_str())
    .bind(now)
    .bind(duration_ms)
    .bind(&meta.title)
    .bind(&meta.description)
    .execute(&state.db)
    .await?;

    info!(
        "Scan {} completed: {} issues, score {}",
        id,
        issues.len(),
        score
    );

    Ok(Json(ScanResponse {
        id,
        url: url.to_string(),
        total_issues: issues.len() as i64,
        issues,
        score,
        status: ScanStatus::Completed,
        created_at: now,
        duration_ms,
        page_title: meta.title,
        page_description: meta.description,
    }))
}

/// Audit record for a failed attempt. Best-effort: a write failure is logged,
/// never propagated over the scan error itself.
async fn record_failed_scan(state: &AppState, user_id: Uuid, url: &str, duration_ms: i64) {
    let result = sqlx::query(
        "INSERT INTO scans (id, user_id, url, total_issues, issues, score, status, created_at, duration_ms, page_title, page_description)
         VALUES (?, ?, ?, 0, '[]', 0, ?, ?, ?, 'Unknown', '')",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(url)
    .bind(ScanStatus::Failed.as_str())
    .bind(Utc::now())
    .bind(duration_ms)
    .execute(&state.db)
    .await;

    if let Err(e) = result {
        error!("Failed to record failed scan of {}: {}", url, e);
    }
}

pub async fn get_scan(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanResponse>> {
    let id = parse_scan_id(&id)?;

    let row = sqlx::query_as::<_, ScanRow>("SELECT * FROM scans WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("scan not found".to_string()))?;

    if row.user_id != user.user_id {
        return Err(ApiError::Forbidden("you do not own this scan".to_string()));
    }

    let response = ScanResponse::try_from(row)
        .map_err(|e| ApiError::Internal(format!("stored issue list is corrupt: {e}")))?;
    Ok(Json(response))
}

pub async fn list_scans(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ScanListResponse>> {
    let page = query.page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let days = query
        .days
        .unwrap_or(DEFAULT_LOOKBACK_DAYS)
        .clamp(1, MAX_LOOKBACK_DAYS);
    let cutoff = Utc::now() - Duration::days(days);
    let offset = (page - 1) * limit;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM scans WHERE user_id = ? AND created_at >= ?",
    )
    .bind(user.user_id)
    .bind(cutoff)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, ScanRow>(
        "SELECT * FROM scans WHERE user_id = ? AND created_at >= ?
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(user.user_id)
    .bind(cutoff)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let scans = rows
        .into_iter()
        .map(|row| ScanSummary {
            id: row.id,
            url: row.url,
            total_issues: row.total_issues,
            score: row.score,
            status: row.status,
            created_at: row.created_at,
            duration_ms: row.duration_ms,
            page_title: row.page_title,
        })
        .collect();

    Ok(Json(ScanListResponse {
        scans,
        page,
        limit,
        total,
        total_pages: (total + limit - 1) / limit,
    }))
}

pub async fn delete_scan(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_scan_id(&id)?;

    // Scoped to the owner: deleting someone else's scan looks like a miss
    let result = sqlx::query("DELETE FROM scans WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("scan not found".to_string()));
    }

    Ok(Json(json!({ "message": "scan deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/page?x=1").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn scan_id_validation() {
        assert!(parse_scan_id(&Uuid::new_v4().to_string()).is_ok());
        assert!(parse_scan_id("abc").is_err());
    }
}
