//! Threshold schema used for CI gating.
//!
//! A `ThresholdConfig` holds optional inclusive ceilings per severity. It is
//! read from `--threshold` JSON or the `[threshold]` table of the config file;
//! unknown keys are rejected.

use super::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Per-severity ceilings. A missing key means no limit for that severity.
pub struct ThresholdConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serious: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderate: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<usize>,
}

impl ThresholdConfig {
    /// Parse the `--threshold` JSON form, e.g. `{"critical":0,"serious":5}`.
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        serde_json::from_str(raw).map_err(|e| crate::error::AuditError::InvalidThreshold(e.to_string()))
    }

    pub fn get(&self, severity: Severity) -> Option<usize> {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// One severity whose count went over its ceiling.
pub struct ThresholdViolation {
    pub severity: Severity,
    pub count: usize,
    pub threshold: usize,
    pub exceeded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Gate decision. `passed` is true exactly when `violations` is empty.
pub struct ThresholdResult {
    pub passed: bool,
    pub violations: Vec<ThresholdViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_threshold_json() {
        let t: ThresholdConfig = serde_json::from_str(r#"{"critical":0,"serious":5}"#).unwrap();
        assert_eq!(t.get(Severity::Critical), Some(0));
        assert_eq!(t.get(Severity::Serious), Some(5));
        assert_eq!(t.get(Severity::Minor), None);
    }

    #[test]
    fn test_unknown_or_non_numeric_keys_rejected() {
        assert!(serde_json::from_str::<ThresholdConfig>(r#"{"blocker":1}"#).is_err());
        assert!(serde_json::from_str::<ThresholdConfig>(r#"{"critical":"none"}"#).is_err());
        assert!(serde_json::from_str::<ThresholdConfig>(r#"{"minor":-1}"#).is_err());
    }

    #[test]
    fn test_from_json_maps_to_threshold_error() {
        let err = ThresholdConfig::from_json("{critical:0}").unwrap_err();
        assert!(err.to_string().starts_with("Invalid threshold JSON."));
        assert_eq!(ThresholdConfig::from_json("{}").unwrap(), ThresholdConfig::default());
    }
}
