//! Shared data models for rule outputs, summaries, and the audit report.
//!
//! All of these are value objects: a rule module creates issues and passed
//! checks once, and every later stage only reads them.

pub mod threshold;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of the markup excerpt stored on an issue.
pub const ELEMENT_HTML_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Problem impact, declared from worst to least severe so `Ord` follows
/// `critical < serious < moderate < minor`.
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    /// Every severity in reporting order.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    /// Sort rank, 0 for critical.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Serious => 1,
            Severity::Moderate => 2,
            Severity::Minor => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Serious => "serious",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Issue category. The eight named variants are the tallied set; `Other`
/// keeps labels introduced by independently authored rule modules.
pub enum Category {
    Images,
    Interactive,
    Forms,
    Color,
    Document,
    Structure,
    Aria,
    Technical,
    #[serde(untagged)]
    Other(String),
}

impl Category {
    /// The eight tallied categories in summary order.
    pub const KNOWN: [Category; 8] = [
        Category::Images,
        Category::Interactive,
        Category::Forms,
        Category::Color,
        Category::Document,
        Category::Structure,
        Category::Aria,
        Category::Technical,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Images => "images",
            Category::Interactive => "interactive",
            Category::Forms => "forms",
            Category::Color => "color",
            Category::Document => "document",
            Category::Structure => "structure",
            Category::Aria => "aria",
            Category::Technical => "technical",
            Category::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// WCAG conformance level.
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Guideline cross-reference attached to an issue.
pub struct Wcag {
    pub id: String,
    pub level: WcagLevel,
    pub name: String,
    pub description: String,
}

impl Wcag {
    pub fn new(id: &str, level: WcagLevel, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            level,
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    /// Placeholder for checks with no guideline mapping.
    pub fn not_applicable() -> Self {
        Self::new("N/A", WcagLevel::A, "", "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Offending DOM location.
pub struct IssueElement {
    pub selector: String,
    pub html: String,
    pub failure_summary: String,
}

impl IssueElement {
    /// Build an element record, capping `html` at [`ELEMENT_HTML_LIMIT`] chars.
    pub fn new(selector: &str, html: &str, failure_summary: &str) -> Self {
        Self {
            selector: selector.to_string(),
            html: html.chars().take(ELEMENT_HTML_LIMIT).collect(),
            failure_summary: failure_summary.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Remediation guidance. `code` may be empty.
pub struct Fix {
    pub description: String,
    pub code: String,
    pub learn_more_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A single detected problem.
pub struct Issue {
    pub id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub description: String,
    pub help_url: String,
    pub wcag: Wcag,
    pub element: IssueElement,
    pub fix: Fix,
}

impl Issue {
    /// Start an issue; the remaining fields are filled with the `with_*`
    /// builders and default to empty text and an `N/A` guideline.
    pub fn new(
        id: impl Into<String>,
        rule_id: &str,
        severity: Severity,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule_id: rule_id.to_string(),
            severity,
            category,
            message: message.into(),
            description: String::new(),
            help_url: String::new(),
            wcag: Wcag::not_applicable(),
            element: IssueElement::new("", "", ""),
            fix: Fix {
                description: String::new(),
                code: String::new(),
                learn_more_url: String::new(),
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_help_url(mut self, url: &str) -> Self {
        self.help_url = url.to_string();
        self
    }

    pub fn with_wcag(mut self, wcag: Wcag) -> Self {
        self.wcag = wcag;
        self
    }

    pub fn with_element(mut self, selector: &str, html: &str, failure_summary: impl AsRef<str>) -> Self {
        self.element = IssueElement::new(selector, html, failure_summary.as_ref());
        self
    }

    /// Attach fix guidance; `learn_more_url` defaults to the help URL when empty.
    pub fn with_fix(mut self, description: impl Into<String>, code: impl Into<String>) -> Self {
        self.fix = Fix {
            description: description.into(),
            code: code.into(),
            learn_more_url: self.help_url.clone(),
        };
        self
    }

    pub fn with_learn_more(mut self, url: &str) -> Self {
        self.fix.learn_more_url = url.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A check that ran and found nothing to report.
pub struct PendingCheck {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
}

impl PendingCheck {
    pub fn new(id: &str, name: &str, category: Category, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.as_str().to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Output of one rule module, and the shape of a merged result.
pub struct AuditOutcome {
    pub issues: Vec<Issue>,
    pub passed: Vec<PendingCheck>,
}

impl AuditOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn pass(&mut self, check: PendingCheck) {
        self.passed.push(check);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Issue counts per severity.
pub struct SeverityCounts {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }

    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Serious => self.serious += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Minor => self.minor += 1,
        }
    }

    pub fn sum(&self) -> usize {
        self.critical + self.serious + self.moderate + self.minor
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Issue counts per tallied category.
pub struct CategoryCounts {
    pub images: usize,
    pub interactive: usize,
    pub forms: usize,
    pub color: usize,
    pub document: usize,
    pub structure: usize,
    pub aria: usize,
    pub technical: usize,
}

impl CategoryCounts {
    /// Count for a category; `Other` is never tallied.
    pub fn get(&self, category: &Category) -> usize {
        match category {
            Category::Images => self.images,
            Category::Interactive => self.interactive,
            Category::Forms => self.forms,
            Category::Color => self.color,
            Category::Document => self.document,
            Category::Structure => self.structure,
            Category::Aria => self.aria,
            Category::Technical => self.technical,
            Category::Other(_) => 0,
        }
    }

    /// Increment a known bucket. Returns false for unrecognized categories.
    pub fn increment(&mut self, category: &Category) -> bool {
        let slot = match category {
            Category::Images => &mut self.images,
            Category::Interactive => &mut self.interactive,
            Category::Forms => &mut self.forms,
            Category::Color => &mut self.color,
            Category::Document => &mut self.document,
            Category::Structure => &mut self.structure,
            Category::Aria => &mut self.aria,
            Category::Technical => &mut self.technical,
            Category::Other(_) => return false,
        };
        *slot += 1;
        true
    }

    pub fn sum(&self) -> usize {
        Category::KNOWN.iter().map(|c| self.get(c)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Aggregated counts derived from an issue list.
pub struct Summary {
    pub total: usize,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
    pub passed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The canonical report for one audit run.
///
/// `timestamp` is the run start in epoch milliseconds and `duration` the
/// wall-clock milliseconds until formatting.
pub struct AuditReport {
    pub url: String,
    pub timestamp: i64,
    pub duration: u64,
    pub issues: Vec<Issue>,
    pub passed: Vec<PendingCheck>,
    pub incomplete: Vec<Issue>,
    pub summary: Summary,
}
