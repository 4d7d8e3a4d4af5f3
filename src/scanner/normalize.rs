//! Normalization of untrusted engine output into typed issue records.

use crate::models::{IssueRecord, Severity};
use serde_json::Value;

fn text(issue: &Value, keys: &[&str]) -> String {
    for key in keys {
        if let Some(s) = issue.get(*key).and_then(Value::as_str) {
            return s.to_string();
        }
    }
    String::new()
}

/// Map raw issue objects to [`IssueRecord`]s with 1-based sequence ids.
///
/// Field names vary between engine runners, so a few aliases are accepted per
/// field. Anything missing defaults to an empty string; unknown severities
/// become notices.
pub fn normalize_issues(raw: &[Value]) -> Vec<IssueRecord> {
    raw.iter()
        .enumerate()
        .map(|(i, issue)| {
            let severity_label = text(issue, &["severity", "type"]);
            IssueRecord {
                id: (i + 1) as u32,
                issue_type: text(issue, &["type", "issue_type"]),
                message: text(issue, &["message", "description"]),
                severity: Severity::parse(&severity_label),
                selector: text(issue, &["selector"]),
                code: text(issue, &["code", "rule"]),
                context: text(issue, &["context", "html"]),
                runner: text(issue, &["runner"]),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assigns_sequential_ids() {
        let raw = vec![json!({"type": "error"}), json!({"type": "warning"})];
        let issues = normalize_issues(&raw);
        assert_eq!(issues[0].id, 1);
        assert_eq!(issues[1].id, 2);
    }

    #[test]
    fn maps_known_fields() {
        let raw = vec![json!({
            "type": "error",
            "message": "Img element missing an alt attribute",
            "severity": "error",
            "selector": "html > body > img",
            "code": "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37",
            "context": "<img src=\"logo.png\">",
            "runner": "htmlcs"
        })];
        let issues = normalize_issues(&raw);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.selector, "html > body > img");
        assert_eq!(issue.runner, "htmlcs");
        assert!(issue.code.starts_with("WCAG2AA"));
    }

    #[test]
    fn missing_fields_default_empty() {
        let issues = normalize_issues(&[json!({})]);
        let issue = &issues[0];
        assert_eq!(issue.message, "");
        assert_eq!(issue.selector, "");
        assert_eq!(issue.severity, Severity::Notice);
    }

    #[test]
    fn severity_falls_back_to_type_field() {
        let issues = normalize_issues(&[json!({"type": "warning"})]);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn non_object_entries_become_empty_notices() {
        let issues = normalize_issues(&[json!("weird"), json!(42)]);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Notice));
    }
}
