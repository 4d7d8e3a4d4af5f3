//! Accessibility score computation.

use crate::models::{IssueRecord, Severity};

const ERROR_WEIGHT: u32 = 10;
const WARNING_WEIGHT: u32 = 5;
const NOTICE_WEIGHT: u32 = 2;

/// Penalty is capped so heavy issue volume has diminishing impact.
const MAX_PENALTY: f64 = 95.0;
const PENALTY_FACTOR: f64 = 0.5;

/// Count issues per severity tier: (errors, warnings, notices).
pub fn severity_counts(issues: &[IssueRecord]) -> (u32, u32, u32) {
    let mut counts = (0, 0, 0);
    for issue in issues {
        match issue.severity {
            Severity::Error => counts.0 += 1,
            Severity::Warning => counts.1 += 1,
            Severity::Notice => counts.2 += 1,
        }
    }
    counts
}

/// Score in [0, 100], monotonically non-increasing in the weighted issue count.
pub fn score_from_counts(errors: u32, warnings: u32, notices: u32) -> i64 {
    let weighted =
        (errors * ERROR_WEIGHT + warnings * WARNING_WEIGHT + notices * NOTICE_WEIGHT) as f64;
    let penalty = (weighted * PENALTY_FACTOR).min(MAX_PENALTY);
    (100.0 - penalty).round().clamp(0.0, 100.0) as i64
}

pub fn score_issues(issues: &[IssueRecord]) -> i64 {
    let (errors, warnings, notices) = severity_counts(issues);
    score_from_counts(errors, warnings, notices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_page_scores_100() {
        assert_eq!(score_from_counts(0, 0, 0), 100);
    }

    #[test]
    fn reference_scenario() {
        // 3 errors, 2 warnings, 1 notice -> weighted 42 -> penalty 21 -> 79
        assert_eq!(score_from_counts(3, 2, 1), 79);
    }

    #[test]
    fn penalty_is_capped() {
        assert_eq!(score_from_counts(1000, 0, 0), 5);
        assert_eq!(score_from_counts(19, 0, 0), 5);
    }

    #[test]
    fn score_stays_in_range() {
        for errors in [0, 1, 5, 50, 10_000] {
            let s = score_from_counts(errors, errors, errors);
            assert!((0..=100).contains(&s));
        }
    }

    #[test]
    fn non_increasing_in_issue_count() {
        let mut last = 101;
        for errors in 0..30 {
            let s = score_from_counts(errors, 0, 0);
            assert!(s <= last);
            last = s;
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(score_from_counts(4, 3, 2), score_from_counts(4, 3, 2));
    }

    #[test]
    fn counts_by_severity() {
        use crate::models::Severity;
        let issues: Vec<IssueRecord> = [Severity::Error, Severity::Error, Severity::Notice]
            .iter()
            .enumerate()
            .map(|(i, s)| IssueRecord {
                id: (i + 1) as u32,
                issue_type: String::new(),
                message: String::new(),
                severity: *s,
                selector: String::new(),
                code: String::new(),
                context: String::new(),
                runner: String::new(),
            })
            .collect();
        assert_eq!(severity_counts(&issues), (2, 0, 1));
        assert_eq!(score_issues(&issues), 89);
    }
}
