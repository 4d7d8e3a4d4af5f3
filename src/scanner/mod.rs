//! Boundary to the external accessibility scanning engine.
//!
//! The engine is consumed over HTTP: given a URL and options it returns a list
//! of raw issue objects plus optional page metadata. Its output is untrusted
//! and goes through [`normalize`] before anything is persisted.

pub mod metadata;
pub mod normalize;
pub mod score;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{DeviceType, ScanType};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("scan timed out after {0} seconds")]
    Timeout(u64),

    #[error("host could not be resolved or reached")]
    UnresolvedHost,

    #[error("engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine returned a malformed report: {0}")]
    Malformed(String),
}

/// Scan options forwarded to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOptions {
    pub timeout_secs: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
}

impl ScanOptions {
    pub fn new(scan_type: ScanType, device_type: DeviceType) -> Self {
        let timeout_secs = match scan_type {
            ScanType::Quick => 15,
            ScanType::Full => 30,
        };
        let (viewport_width, viewport_height, user_agent) = match device_type {
            DeviceType::Desktop => (
                1366,
                768,
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/120.0 Safari/537.36"
                    .to_string(),
            ),
            DeviceType::Mobile => (
                375,
                667,
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Mobile/15E148"
                    .to_string(),
            ),
        };
        Self {
            timeout_secs,
            viewport_width,
            viewport_height,
            user_agent,
        }
    }
}

/// Raw engine output: untrusted issue objects plus optional page metadata.
#[derive(Debug, Default)]
pub struct EngineReport {
    pub issues: Vec<Value>,
    pub document_title: Option<String>,
}

#[async_trait]
pub trait AccessibilityEngine: Send + Sync {
    async fn scan(&self, url: &str, options: &ScanOptions) -> Result<EngineReport, EngineError>;
}

/// HTTP client for a remote scanning engine.
pub struct HttpEngine {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct EngineRequest<'a> {
    url: &'a str,
    timeout_ms: u64,
    viewport_width: u32,
    viewport_height: u32,
    user_agent: &'a str,
}

impl HttpEngine {
    pub fn new(endpoint: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("a11y-api/0.1")
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AccessibilityEngine for HttpEngine {
    async fn scan(&self, url: &str, options: &ScanOptions) -> Result<EngineReport, EngineError> {
        let request = EngineRequest {
            url,
            timeout_ms: options.timeout_secs * 1000,
            viewport_width: options.viewport_width,
            viewport_height: options.viewport_height,
            user_agent: &options.user_agent,
        };

        let send = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .timeout(Duration::from_secs(options.timeout_secs))
            .send();

        let response = match tokio::time::timeout(Duration::from_secs(options.timeout_secs), send)
            .await
        {
            Err(_) => return Err(EngineError::Timeout(options.timeout_secs)),
            Ok(Err(e)) if e.is_timeout() => return Err(EngineError::Timeout(options.timeout_secs)),
            Ok(Err(e)) if e.is_connect() => return Err(EngineError::UnresolvedHost),
            Ok(Err(e)) => return Err(EngineError::Http(e)),
            Ok(Ok(response)) => response,
        };

        let body: Value = response
            .error_for_status()?
            .json()
            .await
            .map_err(|e| EngineError::Malformed(e.to_string()))?;

        // Accept either a bare issue array or an { issues, documentTitle } object.
        let (issues, document_title) = match body {
            Value::Array(issues) => (issues, None),
            Value::Object(mut map) => {
                let issues = match map.remove("issues") {
                    Some(Value::Array(issues)) => issues,
                    Some(other) => {
                        return Err(EngineError::Malformed(format!(
                            "issues field is not an array: {other}"
                        )))
                    }
                    None => Vec::new(),
                };
                let title = map
                    .remove("documentTitle")
                    .and_then(|v| v.as_str().map(str::to_string));
                (issues, title)
            }
            other => {
                return Err(EngineError::Malformed(format!(
                    "unexpected report shape: {other}"
                )))
            }
        };

        Ok(EngineReport {
            issues,
            document_title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_mode() {
        let quick = ScanOptions::new(ScanType::Quick, DeviceType::Desktop);
        assert_eq!(quick.timeout_secs, 15);
        assert_eq!(quick.viewport_width, 1366);

        let full = ScanOptions::new(ScanType::Full, DeviceType::Mobile);
        assert_eq!(full.timeout_secs, 30);
        assert_eq!(full.viewport_width, 375);
        assert!(full.user_agent.contains("iPhone"));
    }
}
