//! Scan aggregation routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::models::{ActivityResponse, DayActivity, StatsResponse};
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::Row;
use std::sync::Arc;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;
// Ten years; chrono::Duration::days panics far past this
const MAX_LOOKBACK_DAYS: i64 = 3650;

fn lookback(days: Option<i64>) -> chrono::Duration {
    Duration::days(days.unwrap_or(DEFAULT_LOOKBACK_DAYS).clamp(1, MAX_LOOKBACK_DAYS))
}

#[derive(Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<StatsResponse>> {
    let cutoff = Utc::now() - lookback(query.days);

    let row = sqlx::query(
        "SELECT COUNT(*) AS total_scans,
                COALESCE(SUM(total_issues), 0) AS total_issues,
                COALESCE(AVG(score), 0.0) AS average_score,
                COUNT(DISTINCT url) AS distinct_urls
         FROM scans WHERE user_id = ? AND created_at >= ?",
    )
    .bind(user.user_id)
    .bind(cutoff)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(StatsResponse {
        total_scans: row.get("total_scans"),
        total_issues: row.get("total_issues"),
        average_score: round1(row.get("average_score")),
        distinct_urls: row.get("distinct_urls"),
    }))
}

pub async fn activity(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<ActivityResponse>> {
    let cutoff = Utc::now() - lookback(query.days);

    // Timestamps are stored ISO-formatted, so the first ten chars are the date
    let rows = sqlx::query(
        "SELECT substr(created_at, 1, 10) AS day,
                COUNT(*) AS scans,
                COALESCE(SUM(total_issues), 0) AS issues,
                COALESCE(AVG(score), 0.0) AS average_score
         FROM scans WHERE user_id = ? AND created_at >= ?
         GROUP BY day ORDER BY day DESC",
    )
    .bind(user.user_id)
    .bind(cutoff)
    .fetch_all(&state.db)
    .await?;

    let days = rows
        .into_iter()
        .map(|row| DayActivity {
            day: row.get("day"),
            scans: row.get("scans"),
            issues: row.get("issues"),
            average_score: round1(row.get("average_score")),
        })
        .collect();

    Ok(Json(ActivityResponse { days }))
}

#[cfg(test)]
mod tests {
    use super::{lookback, round1};

    #[test]
    fn lookback_clamps_extremes() {
        assert_eq!(lookback(Some(200_000_000_000)).num_days(), 3650);
        assert_eq!(lookback(Some(0)).num_days(), 1);
        assert_eq!(lookback(Some(-5)).num_days(), 1);
        assert_eq!(lookback(None).num_days(), 30);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round1(79.333), 79.3);
        assert_eq!(round1(79.35), 79.4);
        assert_eq!(round1(0.0), 0.0);
    }
}
