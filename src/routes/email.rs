//! Email report delivery route

use crate::auth::AuthUser;
use crate::db::schema::{ScanRow, UserRow};
use crate::error::{ApiError, ApiResult};
use crate::mailer::ScanReport;
use crate::models::{EmailReportRequest, IssueRecord};
use crate::scanner::score::severity_counts;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn email_scan_results(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<EmailReportRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let mailer = state
        .mailer
        .as_ref()
        .ok_or(ApiError::MailerNotConfigured)?;

    let recipient = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    if recipient.email.is_empty() {
        return Err(ApiError::Validation(
            "no email address on record".to_string(),
        ));
    }

    // Severity breakdown and samples come from the stored scan when available
    let scan = sqlx::query_as::<_, ScanRow>("SELECT * FROM scans WHERE id = ? AND user_id = ?")
        .bind(req.scan_id)
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?;

    let issues: Vec<IssueRecord> = match &scan {
        Some(row) => serde_json::from_str(&row.issues).unwrap_or_else(|e| {
            warn!("stored issue list for {} is corrupt: {}", row.id, e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    let report = ScanReport {
        url: &req.url,
        score: req.score,
        total_issues: req.total_issues,
        severity_counts: scan.as_ref().map(|_| severity_counts(&issues)),
        samples: &issues,
    };

    mailer
        .send_scan_report(&recipient.email, &report)
        .await
        .map_err(|e| ApiError::Internal(format!("email delivery failed: {e}")))?;

    info!("Scan report for {} mailed to {}", req.url, recipient.email);

    Ok(Json(json!({
        "success": true,
        "message": format!("report sent to {}", recipient.email),
    })))
}
