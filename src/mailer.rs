//! Optional SMTP delivery of scan reports.
//!
//! The transport is built once at startup from `SMTP_*` environment variables
//! and injected through `AppState`; without credentials the email route is
//! disabled.

use crate::models::{IssueRecord, Severity};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("message build failed: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

/// Data rendered into the report email.
pub struct ScanReport<'a> {
    pub url: &'a str,
    pub score: i64,
    pub total_issues: i64,
    /// (errors, warnings, notices) when the referenced scan was found
    pub severity_counts: Option<(u32, u32, u32)>,
    /// Up to five representative issues
    pub samples: &'a [IssueRecord],
}

impl Mailer {
    /// Build the transport from `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`
    /// and `SMTP_FROM`. Returns `None` when any of them is absent.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let username = std::env::var("SMTP_USERNAME").ok()?;
        let password = std::env::var("SMTP_PASSWORD").ok()?;
        let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .ok()?
            .credentials(Credentials::new(username, password))
            .build();

        info!("Email transport configured for {}", host);
        Some(Self { transport, from })
    }

    pub async fn send_scan_report(
        &self,
        to: &str,
        report: &ScanReport<'_>,
    ) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(format!("Accessibility report for {}", report.url))
            .header(ContentType::TEXT_HTML)
            .body(render_report(report))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Notice => "notice",
    }
}

fn render_report(report: &ScanReport<'_>) -> String {
    let breakdown = match report.severity_counts {
        Some((errors, warnings, notices)) => format!(
            "<ul><li>{errors} errors</li><li>{warnings} warnings</li><li>{notices} notices</li></ul>"
        ),
        None => String::new(),
    };

    let samples = report
        .samples
        .iter()
        .take(5)
        .map(|issue| {
            format!(
                "<li><strong>[{}]</strong> {} <code>{}</code></li>",
                severity_label(issue.severity),
                issue.message,
                issue.selector
            )
        })
        .collect::<String>();

    format!(
        r#"<html><body>
<h2>Accessibility scan results</h2>
<p>Scanned URL: <a href="{url}">{url}</a></p>
<p>Score: <strong>{score}/100</strong></p>
<p>Total issues: {total}</p>
{breakdown}
<h3>Representative issues</h3>
<ul>{samples}</ul>
</body></html>"#,
        url = report.url,
        score = report.score,
        total = report.total_issues,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity, message: &str) -> IssueRecord {
        IssueRecord {
            id: 1,
            issue_type: "error".to_string(),
            message: message.to_string(),
            severity,
            selector: "body".to_string(),
            code: String::new(),
            context: String::new(),
            runner: String::new(),
        }
    }

    #[test]
    fn report_embeds_score_and_breakdown() {
        let samples = vec![issue(Severity::Error, "missing alt text")];
        let html = render_report(&ScanReport {
            url: "https://example.com",
            score: 79,
            total_issues: 6,
            severity_counts: Some((3, 2, 1)),
            samples: &samples,
        });
        assert!(html.contains("79/100"));
        assert!(html.contains("3 errors"));
        assert!(html.contains("missing alt text"));
    }

    #[test]
    fn report_caps_samples_at_five() {
        let samples: Vec<IssueRecord> =
            (0..8).map(|i| issue(Severity::Notice, &format!("issue {i}"))).collect();
        let html = render_report(&ScanReport {
            url: "https://example.com",
            score: 90,
            total_issues: 8,
            severity_counts: None,
            samples: &samples,
        });
        assert!(html.contains("issue 4"));
        assert!(!html.contains("issue 5"));
    }
}
