//! The closed set of audit types and their static metadata.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// One of the six rule batteries. Declaration order is dispatch order.
pub enum AuditType {
    Accessibility,
    Performance,
    Seo,
    Security,
    BestPractices,
    Pwa,
}

/// Static description of an audit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

impl AuditType {
    pub const ALL: [AuditType; 6] = [
        AuditType::Accessibility,
        AuditType::Performance,
        AuditType::Seo,
        AuditType::Security,
        AuditType::BestPractices,
        AuditType::Pwa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuditType::Accessibility => "accessibility",
            AuditType::Performance => "performance",
            AuditType::Seo => "seo",
            AuditType::Security => "security",
            AuditType::BestPractices => "best-practices",
            AuditType::Pwa => "pwa",
        }
    }
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        AuditType::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AuditError::UnknownAuditType(s.to_string()))
    }
}

/// All audit types in dispatch order.
pub fn available_audits() -> Vec<AuditType> {
    AuditType::ALL.to_vec()
}

/// Metadata lookup for an audit type.
pub fn audit_info(audit: AuditType) -> AuditInfo {
    match audit {
        AuditType::Accessibility => AuditInfo {
            name: "Accessibility",
            description: "Checks WCAG 2.1 compliance covering images, interactive elements, forms, ARIA, and document structure",
            category: "Compliance",
        },
        AuditType::Performance => AuditInfo {
            name: "Performance",
            description: "Analyzes page performance including resource optimization, image loading, JavaScript efficiency, and layout stability",
            category: "Speed",
        },
        AuditType::Seo => AuditInfo {
            name: "SEO",
            description: "Validates SEO best practices including meta tags, headings, structured data, and crawlability",
            category: "Discoverability",
        },
        AuditType::Security => AuditInfo {
            name: "Security",
            description: "Checks security headers, HTTPS usage, mixed content, and password field security",
            category: "Safety",
        },
        AuditType::BestPractices => AuditInfo {
            name: "Best Practices",
            description: "Validates HTML standards, deprecated elements, unique IDs, and modern web development practices",
            category: "Quality",
        },
        AuditType::Pwa => AuditInfo {
            name: "Progressive Web App",
            description: "Checks PWA requirements including manifest, service worker, HTTPS, and mobile optimization",
            category: "Installability",
        },
    }
}

/// Parse a comma-separated audit list. Every name must be known; blank
/// segments are ignored.
pub fn parse_audit_list(list: &str) -> Result<Vec<AuditType>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AuditType::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_audits_order() {
        let names: Vec<&str> = available_audits().into_iter().map(AuditType::as_str).collect();
        assert_eq!(
            names,
            vec!["accessibility", "performance", "seo", "security", "best-practices", "pwa"]
        );
    }

    #[test]
    fn test_parse_audit_list_strict() {
        let parsed = parse_audit_list("pwa, security").unwrap();
        assert_eq!(parsed, vec![AuditType::Pwa, AuditType::Security]);
        let err = parse_audit_list("pwa,speed").unwrap_err();
        assert!(matches!(err, AuditError::UnknownAuditType(ref s) if s == "speed"));
    }

    #[test]
    fn test_audit_info_is_static() {
        assert_eq!(audit_info(AuditType::Pwa).name, "Progressive Web App");
        assert_eq!(audit_info(AuditType::BestPractices).category, "Quality");
    }

    #[test]
    fn test_serde_names_match_cli_names() {
        let v: AuditType = serde_json::from_str("\"best-practices\"").unwrap();
        assert_eq!(v, AuditType::BestPractices);
    }
}
