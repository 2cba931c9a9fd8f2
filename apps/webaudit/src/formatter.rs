//! Summary computation and report assembly.
//!
//! Everything here is pure: the same inputs always produce the same
//! `Summary`/`AuditReport`, and nothing holds state between calls.

use crate::models::{AuditOutcome, AuditReport, Category, Issue, PendingCheck, Severity, Summary};
use std::collections::BTreeMap;

/// Tally issues by severity and by the eight known categories.
///
/// Issues with an unrecognized category still count toward `total` and
/// `by_severity`; they are left out of `by_category`. `passed` is zero here
/// because only issues are seen.
pub fn generate_summary(issues: &[Issue]) -> Summary {
    let mut summary = Summary {
        total: issues.len(),
        ..Summary::default()
    };
    for issue in issues {
        summary.by_severity.increment(issue.severity);
        summary.by_category.increment(&issue.category);
    }
    summary
}

/// Assemble the canonical report.
///
/// `duration` is `end - start`; callers pass `end >= start`.
pub fn format_results(
    url: &str,
    start: i64,
    end: i64,
    issues: Vec<Issue>,
    passed: Vec<PendingCheck>,
    incomplete: Vec<Issue>,
) -> AuditReport {
    debug_assert!(end >= start, "end time precedes start time");
    let mut summary = generate_summary(&issues);
    summary.passed = passed.len();
    AuditReport {
        url: url.to_string(),
        timestamp: start,
        duration: end.saturating_sub(start).max(0) as u64,
        issues,
        passed,
        incomplete,
        summary,
    }
}

/// Concatenate module outputs in input order. No dedup, no sorting.
pub fn merge_audit_results(results: Vec<AuditOutcome>) -> AuditOutcome {
    results.into_iter().fold(AuditOutcome::new(), |mut acc, r| {
        acc.issues.extend(r.issues);
        acc.passed.extend(r.passed);
        acc
    })
}

/// Stable sort by severity (worst first), ties broken by category name.
pub fn sort_issues(issues: &[Issue]) -> Vec<&Issue> {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    sorted
}

pub fn group_by_category(issues: &[Issue]) -> BTreeMap<String, Vec<&Issue>> {
    let mut groups: BTreeMap<String, Vec<&Issue>> = BTreeMap::new();
    for issue in issues {
        groups
            .entry(issue.category.as_str().to_string())
            .or_default()
            .push(issue);
    }
    groups
}

/// Every severity is present as a key, possibly with no issues.
pub fn group_by_severity(issues: &[Issue]) -> BTreeMap<Severity, Vec<&Issue>> {
    let mut groups: BTreeMap<Severity, Vec<&Issue>> =
        Severity::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for issue in issues {
        groups.entry(issue.severity).or_default().push(issue);
    }
    groups
}

pub fn filter_by_severity(issues: &[Issue], severity: Severity) -> Vec<&Issue> {
    issues.iter().filter(|i| i.severity == severity).collect()
}

pub fn filter_by_category<'a>(issues: &'a [Issue], category: &Category) -> Vec<&'a Issue> {
    issues.iter().filter(|i| &i.category == category).collect()
}

/// The `n` worst issues in [`sort_issues`] order.
pub fn get_top_issues(issues: &[Issue], n: usize) -> Vec<&Issue> {
    let mut sorted = sort_issues(issues);
    sorted.truncate(n);
    sorted
}

/// Percentage of passed checks, rounded. An empty run counts as 100.
pub fn calculate_pass_rate(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((passed as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(id: &str, severity: Severity, category: Category) -> Issue {
        Issue::new(id, "rule", severity, category, "msg")
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("a", Severity::Minor, Category::Images),
            issue("b", Severity::Critical, Category::Technical),
            issue("c", Severity::Serious, Category::Forms),
            issue("d", Severity::Critical, Category::Aria),
            issue("e", Severity::Moderate, Category::Other("motion".into())),
            issue("f", Severity::Critical, Category::Aria),
        ]
    }

    #[test]
    fn test_summary_counts_are_consistent() {
        let issues = sample();
        let summary = generate_summary(&issues);
        assert_eq!(summary.total, issues.len());
        assert_eq!(summary.by_severity.sum(), summary.total);
        assert_eq!(summary.by_severity.critical, 3);
        assert_eq!(summary.passed, 0);
    }

    #[test]
    fn test_unknown_category_left_out_of_category_tally() {
        let issues = sample();
        let summary = generate_summary(&issues);
        assert_eq!(summary.by_severity.moderate, 1);
        assert_eq!(summary.by_category.sum(), issues.len() - 1);
        assert_eq!(summary.by_category.aria, 2);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let issues = sample();
        assert_eq!(generate_summary(&issues), generate_summary(&issues));
    }

    #[test]
    fn test_merge_preserves_order() {
        let first = AuditOutcome {
            issues: vec![issue("a", Severity::Minor, Category::Images), issue("b", Severity::Critical, Category::Aria)],
            passed: vec![],
        };
        let second = AuditOutcome {
            issues: vec![issue("c", Severity::Serious, Category::Forms)],
            passed: vec![PendingCheck::new("p", "P", Category::Document, "ok")],
        };
        let merged = merge_audit_results(vec![first, second]);
        let ids: Vec<&str> = merged.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged.passed.len(), 1);
    }

    #[test]
    fn test_sort_by_severity_then_category() {
        let issues = sample();
        let ids: Vec<&str> = sort_issues(&issues).iter().map(|i| i.id.as_str()).collect();
        // d and f tie on severity and category; input order is kept.
        assert_eq!(ids, vec!["d", "f", "b", "c", "e", "a"]);
        assert_eq!(
            get_top_issues(&issues, 2).iter().map(|i| i.id.as_str()).collect::<Vec<_>>(),
            vec!["d", "f"]
        );
    }

    #[test]
    fn test_groups_and_filters() {
        let issues = sample();
        let by_sev = group_by_severity(&issues);
        assert_eq!(by_sev.len(), 4);
        assert_eq!(by_sev[&Severity::Critical].len(), 3);
        let by_cat = group_by_category(&issues);
        assert_eq!(by_cat["motion"].len(), 1);
        assert_eq!(filter_by_severity(&issues, Severity::Serious).len(), 1);
        assert_eq!(filter_by_category(&issues, &Category::Aria).len(), 2);
    }

    #[test]
    fn test_format_results_fills_duration_and_passed() {
        let passed = vec![PendingCheck::new("p", "P", Category::Document, "ok")];
        let report = format_results("https://example.com", 1_000, 1_250, sample(), passed, vec![]);
        assert_eq!(report.timestamp, 1_000);
        assert_eq!(report.duration, 250);
        assert_eq!(report.summary.total, 6);
        assert_eq!(report.summary.passed, 1);
    }

    #[test]
    fn test_pass_rate() {
        assert_eq!(calculate_pass_rate(0, 0), 100);
        assert_eq!(calculate_pass_rate(1, 3), 33);
        assert_eq!(calculate_pass_rate(2, 3), 67);
    }
}
