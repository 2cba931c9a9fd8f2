//! Error taxonomy for audit runs.
//!
//! Everything in this enum is fatal to the run that raised it. Rule module
//! failures are the exception: the orchestrator catches them and turns them
//! into `incomplete` entries instead of propagating them.

use crate::audits::AuditType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to load page {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response body of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Audit timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Unknown audit type: {0}")]
    UnknownAuditType(String),

    #[error("No rule module registered for audit type: {0}")]
    UnregisteredAudit(AuditType),

    #[error("Invalid URL \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid format \"{0}\". Must be one of: terminal, json, html, all")]
    InvalidFormat(String),

    #[error("Invalid threshold JSON. {0}")]
    InvalidThreshold(String),

    #[error("Invalid config file {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("Rule module error: {0}")]
    Rule(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuditError {
    /// Whether this error came from the overall audit deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AuditError::Timeout { .. })
    }
}
