//! Scan models

use crate::db::schema::ScanRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issue severity tiers reported by the accessibility engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl Severity {
    /// Normalize an external severity label. Unknown labels rank lowest.
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "error" | "critical" | "serious" => Severity::Error,
            "warning" | "moderate" => Severity::Warning,
            _ => Severity::Notice,
        }
    }
}

/// Canonical issue record embedded in a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    /// 1-based sequence within the scan
    pub id: u32,
    pub issue_type: String,
    pub message: String,
    pub severity: Severity,
    pub selector: String,
    pub code: String,
    pub context: String,
    pub runner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => ScanStatus::Pending,
            "running" => ScanStatus::Running,
            "completed" => ScanStatus::Completed,
            _ => ScanStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    #[default]
    Quick,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Desktop,
    Mobile,
}

#[derive(Debug, Deserialize)]
pub struct CreateScanRequest {
    pub url: String,
    #[serde(default)]
    pub scan_type: ScanType,
    #[serde(default)]
    pub device_type: DeviceType,
}

/// Full scan record, issue list included.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    pub id: Uuid,
    pub url: String,
    pub total_issues: i64,
    pub issues: Vec<IssueRecord>,
    pub score: i64,
    pub status: ScanStatus,
    pub created_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub page_title: String,
    pub page_description: String,
}

impl TryFrom<ScanRow> for ScanResponse {
    type Error = serde_json::Error;

    fn try_from(row: ScanRow) -> Result<Self, Self::Error> {
        let issues: Vec<IssueRecord> = serde_json::from_str(&row.issues)?;
        Ok(Self {
            id: row.id,
            url: row.url,
            total_issues: row.total_issues,
            issues,
            score: row.score,
            status: ScanStatus::parse(&row.status),
            created_at: row.created_at,
            duration_ms: row.duration_ms,
            page_title: row.page_title,
            page_description: row.page_description,
        })
    }
}

/// List entry: everything but the issue details.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanSummary {
    pub id: Uuid,
    pub url: String,
    pub total_issues: i64,
    pub score: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub page_title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanListResponse {
    pub scans: Vec<ScanSummary>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_scans: i64,
    pub total_issues: i64,
    pub average_score: f64,
    pub distinct_urls: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayActivity {
    pub day: String,
    pub scans: i64,
    pub issues: i64,
    pub average_score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub days: Vec<DayActivity>,
}

#[derive(Debug, Deserialize)]
pub struct EmailReportRequest {
    pub scan_id: Uuid,
    pub url: String,
    pub score: i64,
    pub total_issues: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_normalization() {
        assert_eq!(Severity::parse("error"), Severity::Error);
        assert_eq!(Severity::parse("Warning"), Severity::Warning);
        assert_eq!(Severity::parse("notice"), Severity::Notice);
        assert_eq!(Severity::parse("bogus"), Severity::Notice);
        assert_eq!(Severity::parse(""), Severity::Notice);
    }

    #[test]
    fn severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        let s: Severity = serde_json::from_str("\"notice\"").unwrap();
        assert_eq!(s, Severity::Notice);
    }
}
