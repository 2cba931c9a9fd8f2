//! webaudit core library.
//!
//! This crate loads a web page once, runs independent audit modules against
//! the parsed document concurrently, and aggregates their findings into a
//! single report with a summary and optional CI threshold gate.
//!
//! High-level modules:
//! - `audits`: The closed set of audit types and their metadata.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `dom`: Selector and markup helpers shared by rule modules.
//! - `error`: The `AuditError` taxonomy.
//! - `formatter`: Summary computation, merging, sorting, and grouping.
//! - `ids`: Per-run issue id generation.
//! - `models`: Issues, passed checks, summaries, reports, thresholds.
//! - `orchestrator`: Page load, concurrent dispatch, isolation, deadline.
//! - `output`: Terminal/JSON/HTML renderers.
//! - `page`: Page snapshot and the HTTP page loader.
//! - `persist`: Report file naming and writing.
//! - `rules`: The rule module trait, registry, and the six audit modules.
//! - `threshold`: Severity ceiling checks.
//! - `utils`: Supporting helpers.
pub mod audits;
pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod formatter;
pub mod ids;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod page;
pub mod persist;
pub mod rules;
pub mod threshold;
pub mod utils;

pub use error::{AuditError, Result};
pub use orchestrator::{AuditOptions, Auditor};
