//! CI gating: compare severity counts against configured ceilings.

use crate::models::threshold::{ThresholdConfig, ThresholdResult, ThresholdViolation};
use crate::models::{AuditReport, Severity, SeverityCounts};

/// Evaluate `report` against `threshold`. No threshold always passes.
pub fn check_thresholds(report: &AuditReport, threshold: Option<&ThresholdConfig>) -> ThresholdResult {
    match threshold {
        Some(t) => check_counts(&report.summary.by_severity, t),
        None => ThresholdResult {
            passed: true,
            violations: Vec::new(),
        },
    }
}

/// A severity is violated only when it has a ceiling and its count is
/// strictly above it. Violations come out in severity order.
pub fn check_counts(counts: &SeverityCounts, threshold: &ThresholdConfig) -> ThresholdResult {
    let violations: Vec<ThresholdViolation> = Severity::ALL
        .iter()
        .filter_map(|&severity| {
            let limit = threshold.get(severity)?;
            let count = counts.get(severity);
            (count > limit).then(|| ThresholdViolation {
                severity,
                count,
                threshold: limit,
                exceeded: count - limit,
            })
        })
        .collect();
    ThresholdResult {
        passed: violations.is_empty(),
        violations,
    }
}

/// Human-readable listing, or `None` when the gate passed.
pub fn format_threshold_violations(result: &ThresholdResult) -> Option<String> {
    if result.passed {
        return None;
    }
    let mut out = String::from("❌ Threshold violations:");
    for v in &result.violations {
        out.push_str(&format!(
            "\n  - {}: {} issues (threshold: {}, exceeded by {})",
            v.severity, v.count, v.threshold, v.exceeded
        ));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format_results;

    fn report_with(counts: SeverityCounts) -> AuditReport {
        let mut report = format_results("https://example.com", 0, 0, vec![], vec![], vec![]);
        report.summary.by_severity = counts;
        report.summary.total = counts.sum();
        report
    }

    #[test]
    fn test_gating_reports_each_exceeded_severity() {
        let report = report_with(SeverityCounts {
            critical: 1,
            serious: 6,
            moderate: 0,
            minor: 0,
        });
        let threshold = ThresholdConfig {
            critical: Some(0),
            serious: Some(5),
            ..Default::default()
        };
        let result = check_thresholds(&report, Some(&threshold));
        assert!(!result.passed);
        assert_eq!(
            result.violations,
            vec![
                ThresholdViolation { severity: Severity::Critical, count: 1, threshold: 0, exceeded: 1 },
                ThresholdViolation { severity: Severity::Serious, count: 6, threshold: 5, exceeded: 1 },
            ]
        );
    }

    #[test]
    fn test_no_threshold_always_passes() {
        let report = report_with(SeverityCounts {
            critical: 50,
            serious: 50,
            moderate: 50,
            minor: 50,
        });
        let result = check_thresholds(&report, None);
        assert!(result.passed);
        assert!(result.violations.is_empty());
        assert_eq!(format_threshold_violations(&result), None);
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let counts = SeverityCounts {
            minor: 3,
            ..Default::default()
        };
        let threshold = ThresholdConfig {
            minor: Some(3),
            ..Default::default()
        };
        assert!(check_counts(&counts, &threshold).passed);
    }

    #[test]
    fn test_violation_listing() {
        let result = ThresholdResult {
            passed: false,
            violations: vec![ThresholdViolation {
                severity: Severity::Serious,
                count: 6,
                threshold: 5,
                exceeded: 1,
            }],
        };
        assert_eq!(
            format_threshold_violations(&result).unwrap(),
            "❌ Threshold violations:\n  - serious: 6 issues (threshold: 5, exceeded by 1)"
        );
        let header_only = ThresholdResult {
            passed: false,
            violations: vec![],
        };
        assert_eq!(format_threshold_violations(&header_only).unwrap(), "❌ Threshold violations:");
    }
}
