//! Report rendering: terminal, JSON, and HTML.
//!
//! The `compose_*` functions are pure and return strings so they can be
//! tested directly; `render_report` and `print_summary` are the thin
//! printing wrappers the binary calls.

use crate::error::{AuditError, Result};
use crate::formatter::{calculate_pass_rate, get_top_issues, sort_issues};
use crate::models::threshold::ThresholdConfig;
use crate::models::{AuditReport, Category, Issue, Severity};
use crate::threshold::{check_thresholds, format_threshold_violations};
use owo_colors::OwoColorize;
use std::str::FromStr;

/// Issues and passed checks shown in the terminal report.
const TERMINAL_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One concrete report renderer.
pub enum ReportFormat {
    Terminal,
    Json,
    Html,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Terminal, ReportFormat::Json, ReportFormat::Html];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Terminal => "terminal",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }

    /// File extension for formats that are saved to disk.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            ReportFormat::Terminal => None,
            ReportFormat::Json => Some("json"),
            ReportFormat::Html => Some("html"),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "terminal" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            other => Err(AuditError::InvalidFormat(other.to_string())),
        }
    }
}

/// Parse a `--format` value. `all` expands to terminal, json, and html.
pub fn parse_formats(raw: &str) -> Result<Vec<ReportFormat>> {
    match raw.trim() {
        "all" => Ok(ReportFormat::ALL.to_vec()),
        single => Ok(vec![single.parse()?]),
    }
}

/// Render `report` in `format`. Terminal output is printed and yields
/// `None`; JSON and HTML are returned for the caller to persist.
pub fn render_report(
    report: &AuditReport,
    format: ReportFormat,
    threshold: Option<&ThresholdConfig>,
    color: bool,
) -> Result<Option<String>> {
    match format {
        ReportFormat::Terminal => {
            println!("{}", compose_terminal(report, threshold, color));
            Ok(None)
        }
        ReportFormat::Json => compose_report_json(report).map(Some),
        ReportFormat::Html => Ok(Some(compose_html(report, threshold))),
    }
}

pub fn compose_report_json(report: &AuditReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn paint_severity(severity: Severity, text: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match severity {
        Severity::Critical => text.red().to_string(),
        Severity::Serious => text.yellow().to_string(),
        Severity::Moderate => text.magenta().to_string(),
        Severity::Minor => text.cyan().to_string(),
    }
}

fn issue_lines(issue: &Issue, color: bool) -> Vec<String> {
    let tag = format!("[{}]", issue.severity.as_str().to_uppercase());
    let mut lines = vec![format!(
        "{} {} ({})",
        paint_severity(issue.severity, &tag, color),
        issue.message,
        issue.category
    )];
    if !issue.description.is_empty() {
        let desc = if color {
            issue.description.bright_black().to_string()
        } else {
            issue.description.clone()
        };
        lines.push(format!("    {}", desc));
    }
    let wcag_label = if color { "WCAG:".cyan().to_string() } else { "WCAG:".to_string() };
    lines.push(format!(
        "    {} {} (Level {}) - {}",
        wcag_label, issue.wcag.id, issue.wcag.level, issue.wcag.name
    ));
    if !issue.element.selector.is_empty() {
        lines.push(format!("    at {}", issue.element.selector));
    }
    if !issue.fix.description.is_empty() {
        let fix_label = if color { "Fix:".green().to_string() } else { "Fix:".to_string() };
        lines.push(format!("    {} {}", fix_label, issue.fix.description));
    }
    lines
}

/// Console report: counts, the worst issues, incomplete modules, passed
/// checks, and the threshold verdict when one is configured.
pub fn compose_terminal(report: &AuditReport, threshold: Option<&ThresholdConfig>, color: bool) -> String {
    let title = "webaudit Audit Report";
    let mut lines = vec![
        if color { title.bold().to_string() } else { title.to_string() },
        format!("URL: {}", report.url),
        format!("Duration: {}ms", report.duration),
        format!("Total Issues: {}", report.summary.total),
        String::new(),
        "Severity Counts:".to_string(),
    ];
    for severity in Severity::ALL {
        let name = format!("{:<8}", severity.as_str());
        lines.push(format!(
            "  {}: {}",
            paint_severity(severity, &name, color),
            report.summary.by_severity.get(severity)
        ));
    }

    lines.push(String::new());
    lines.push("Category Counts:".to_string());
    for category in Category::KNOWN {
        lines.push(format!(
            "  {:<12}: {}",
            category.as_str(),
            report.summary.by_category.get(&category)
        ));
    }

    lines.push(String::new());
    if report.issues.is_empty() {
        lines.push("No issues found! 🎉".to_string());
    } else {
        lines.push("Top Issues:".to_string());
        for issue in get_top_issues(&report.issues, TERMINAL_LIMIT) {
            lines.extend(issue_lines(issue, color));
        }
        if report.issues.len() > TERMINAL_LIMIT {
            lines.push(format!("  ... and {} more", report.issues.len() - TERMINAL_LIMIT));
        }
    }

    if !report.incomplete.is_empty() {
        lines.push(String::new());
        lines.push("Incomplete Audits:".to_string());
        for issue in &report.incomplete {
            lines.push(format!("  {}: {}", issue.message, issue.element.failure_summary));
        }
    }

    if !report.passed.is_empty() {
        lines.push(String::new());
        lines.push("Passed Checks:".to_string());
        for check in report.passed.iter().take(TERMINAL_LIMIT) {
            let name = if color { check.name.green().to_string() } else { check.name.clone() };
            lines.push(format!("  {} ({})", name, check.category));
        }
        if report.passed.len() > TERMINAL_LIMIT {
            lines.push(format!("  ... and {} more", report.passed.len() - TERMINAL_LIMIT));
        }
    }

    if threshold.is_some() {
        let result = check_thresholds(report, threshold);
        lines.push(String::new());
        match format_threshold_violations(&result) {
            Some(text) => lines.push(if color { text.red().to_string() } else { text }),
            None => lines.push("Threshold: passed".to_string()),
        }
    }

    if report.summary.total == 0 {
        lines.push(String::new());
        let done = "All checks passed!";
        lines.push(if color { done.green().to_string() } else { done.to_string() });
    }
    lines.join("\n")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_issue(issue: &Issue) -> String {
    let mut block = format!(
        "    <div class=\"issue {sev}\">\n      <b>[{tag}]</b> {msg} <span class=\"cat\">({cat})</span><br>\n",
        sev = issue.severity.as_str(),
        tag = issue.severity.as_str().to_uppercase(),
        msg = escape_html(&issue.message),
        cat = escape_html(issue.category.as_str()),
    );
    if !issue.description.is_empty() {
        block.push_str(&format!("      <span class=\"desc\">{}</span><br>\n", escape_html(&issue.description)));
    }
    block.push_str(&format!(
        "      <span class=\"wcag\">WCAG {} (Level {}) - {}</span><br>\n",
        escape_html(&issue.wcag.id),
        issue.wcag.level,
        escape_html(&issue.wcag.name)
    ));
    if !issue.element.selector.is_empty() {
        block.push_str(&format!("      <code>{}</code><br>\n", escape_html(&issue.element.selector)));
    }
    if !issue.element.failure_summary.is_empty() {
        block.push_str(&format!(
            "      <span class=\"desc\">{}</span><br>\n",
            escape_html(&issue.element.failure_summary)
        ));
    }
    if !issue.fix.description.is_empty() {
        block.push_str(&format!("      <span class=\"fix\">Fix: {}</span><br>\n", escape_html(&issue.fix.description)));
    }
    if !issue.fix.code.is_empty() {
        block.push_str(&format!("      <pre>{}</pre>\n", escape_html(&issue.fix.code)));
    }
    if !issue.help_url.is_empty() {
        let url = escape_html(&issue.help_url);
        block.push_str(&format!("      <a href=\"{}\">{}</a>\n", url, url));
    }
    block.push_str("    </div>\n");
    block
}

/// Standalone HTML dashboard. All report text is escaped.
pub fn compose_html(report: &AuditReport, threshold: Option<&ThresholdConfig>) -> String {
    let severity_items: String = Severity::ALL
        .iter()
        .map(|s| {
            format!(
                "<li class=\"{0}\">{0}: {1}</li>",
                s.as_str(),
                report.summary.by_severity.get(*s)
            )
        })
        .collect();
    let category_items: String = Category::KNOWN
        .iter()
        .map(|c| format!("<li>{}: {}</li>", c.as_str(), report.summary.by_category.get(c)))
        .collect();
    let issues: String = if report.issues.is_empty() {
        "    <div>No issues found! 🎉</div>\n".to_string()
    } else {
        sort_issues(&report.issues).into_iter().map(html_issue).collect()
    };
    let incomplete: String = if report.incomplete.is_empty() {
        String::new()
    } else {
        format!(
            "  <h2>Incomplete Audits</h2>\n{}",
            report.incomplete.iter().map(html_issue).collect::<String>()
        )
    };
    let passed: String = report
        .passed
        .iter()
        .map(|c| {
            format!(
                "<li class=\"passed\">{} ({})</li>",
                escape_html(&c.name),
                escape_html(&c.category)
            )
        })
        .collect();
    let gate = match threshold {
        None => String::new(),
        Some(_) => {
            let result = check_thresholds(report, threshold);
            match format_threshold_violations(&result) {
                Some(text) => format!("  <pre class=\"critical\">{}</pre>\n", escape_html(&text)),
                None => "  <div class=\"passed\">Threshold: passed</div>\n".to_string(),
            }
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>webaudit Audit Report</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    h1 {{ color: #1a73e8; }}
    .critical {{ color: #d32f2f; }}
    .serious {{ color: #fbc02d; }}
    .moderate {{ color: #7b1fa2; }}
    .minor {{ color: #0288d1; }}
    .passed {{ color: #388e3c; }}
    .issue {{ margin-bottom: 1.2em; }}
    .fix {{ color: #388e3c; font-size: 0.95em; }}
    .desc {{ color: #555; font-size: 0.97em; }}
    .cat, .wcag {{ font-size: 0.95em; color: #888; }}
    pre {{ background: #f5f5f5; padding: 0.5em; }}
  </style>
</head>
<body>
  <h1>webaudit Audit Report</h1>
  <div><b>URL:</b> {url}</div>
  <div><b>Duration:</b> {duration}ms</div>
  <div><b>Total Issues:</b> {total}</div>
  <div><b>Passed Checks:</b> {passed_count}</div>
{gate}  <h2>Severity Counts</h2>
  <ul>{severity_items}</ul>
  <h2>Category Counts</h2>
  <ul>{category_items}</ul>
  <h2>Issues</h2>
{issues}{incomplete}  <h2>Passed Checks</h2>
  <ul>{passed}</ul>
</body>
</html>
"#,
        url = escape_html(&report.url),
        duration = report.duration,
        total = report.summary.total,
        passed_count = report.summary.passed,
    )
}

/// Post-run summary block.
pub fn compose_summary(report: &AuditReport, color: bool) -> String {
    let s = &report.summary;
    let count = |severity: Severity| paint_severity(severity, &s.by_severity.get(severity).to_string(), color);
    let passed = if color { s.passed.green().to_string() } else { s.passed.to_string() };
    let heading = "📈 Summary:";
    [
        if color { heading.bold().to_string() } else { heading.to_string() },
        format!("  Total issues: {}", s.total),
        format!("  Critical: {}", count(Severity::Critical)),
        format!("  Serious: {}", count(Severity::Serious)),
        format!("  Moderate: {}", count(Severity::Moderate)),
        format!("  Minor: {}", count(Severity::Minor)),
        format!("  Passed checks: {}", passed),
        format!("  Pass rate: {}%", calculate_pass_rate(s.passed, s.passed + s.total)),
        format!("  Duration: {:.2}s", report.duration as f64 / 1000.0),
    ]
    .join("\n")
}

pub fn print_summary(report: &AuditReport, color: bool) {
    println!("\n{}", compose_summary(report, color));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format_results;
    use crate::models::PendingCheck;

    fn report() -> AuditReport {
        let issues = vec![
            Issue::new("a", "image-alt", Severity::Minor, Category::Images, "Alt <missing>")
                .with_description("desc & more")
                .with_element("img", "<img>", "no alt")
                .with_fix("Add alt", "<img alt=\"x\">"),
            Issue::new("b", "html-lang", Severity::Critical, Category::Document, "No lang"),
        ];
        let passed = vec![PendingCheck::new("p", "Title", Category::Document, "ok")];
        format_results("https://example.com/?q=<x>", 0, 1_500, issues, passed, vec![])
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_formats("all").unwrap(), ReportFormat::ALL.to_vec());
        assert_eq!(parse_formats("json").unwrap(), vec![ReportFormat::Json]);
        let err = parse_formats("pdf").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid format \"pdf\". Must be one of: terminal, json, html, all"
        );
    }

    #[test]
    fn test_terminal_plain_lists_worst_first() {
        let out = compose_terminal(&report(), None, false);
        assert!(out.contains("Total Issues: 2"));
        assert!(out.contains("  critical: 1"));
        let critical = out.find("[CRITICAL] No lang").unwrap();
        let minor = out.find("[MINOR] Alt <missing>").unwrap();
        assert!(critical < minor);
        assert!(out.contains("    Fix: Add alt"));
        assert!(out.contains("  Title (document)"));
        assert!(!out.contains("Threshold"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_terminal_shows_threshold_verdict() {
        let t = ThresholdConfig {
            critical: Some(0),
            ..Default::default()
        };
        let out = compose_terminal(&report(), Some(&t), false);
        assert!(out.contains("  - critical: 1 issues (threshold: 0, exceeded by 1)"));
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = compose_report_json(&report()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["summary"]["bySeverity"]["critical"], 1);
        assert_eq!(v["summary"]["passed"], 1);
        assert_eq!(v["issues"][0]["ruleId"], "image-alt");
        assert_eq!(v["issues"][0]["element"]["failureSummary"], "no alt");
    }

    #[test]
    fn test_html_escapes_report_text() {
        let html = compose_html(&report(), None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("https://example.com/?q=&lt;x&gt;"));
        assert!(html.contains("Alt &lt;missing&gt;"));
        assert!(html.contains("desc &amp; more"));
        assert!(html.contains("&lt;img alt=&quot;x&quot;&gt;"));
        assert!(!html.contains("Alt <missing>"));
    }

    #[test]
    fn test_summary_block() {
        let out = compose_summary(&report(), false);
        assert!(out.contains("  Critical: 1"));
        assert!(out.contains("  Passed checks: 1"));
        assert!(out.contains("  Pass rate: 33%"));
        assert!(out.contains("  Duration: 1.50s"));
    }
}
