//! Configuration discovery and effective settings resolution.
//!
//! webaudit reads `webaudit.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `format`: `terminal`
//! - `output_dir`: `./webaudit-reports`
//! - `timeout_ms`: 30000, `max_size`: 10 MiB, `audit_timeout_ms`: 60000
//! - `allow_js`: false
//! - no skipped audits, no threshold
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::audits::{parse_audit_list, AuditType};
use crate::error::{AuditError, Result};
use crate::models::threshold::ThresholdConfig;
use crate::orchestrator::{AuditOptions, DEFAULT_AUDIT_TIMEOUT};
use crate::output::{parse_formats, ReportFormat};
use crate::page::{LoadOptions, DEFAULT_LOAD_TIMEOUT, DEFAULT_MAX_SIZE};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Config file names, in lookup order.
pub const CONFIG_FILES: [&str; 3] = ["webaudit.toml", "webaudit.yaml", "webaudit.yml"];

pub const DEFAULT_OUTPUT_DIR: &str = "./webaudit-reports";

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
/// Root configuration loaded from `webaudit.toml|yaml`.
pub struct WebauditConfig {
    pub format: Option<String>,
    pub output_dir: Option<String>,
    pub skip_audits: Option<Vec<String>>,
    pub allow_js: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_size: Option<u64>,
    pub audit_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub threshold: Option<ThresholdConfig>,
}

/// Values taken from the command line. `None` means "not passed".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub config_dir: Option<String>,
    pub format: Option<String>,
    pub output_dir: Option<String>,
    pub skip_audits: Option<String>,
    pub allow_js: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_size: Option<u64>,
    pub audit_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    /// Raw `--threshold` JSON.
    pub threshold: Option<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the binary after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_found: bool,
    /// The format label as given (`terminal|json|html|all`).
    pub format: String,
    pub formats: Vec<ReportFormat>,
    pub output_dir: PathBuf,
    pub skip_audits: Vec<AuditType>,
    pub allow_js: bool,
    pub timeout: Duration,
    pub max_size: u64,
    pub audit_timeout: Duration,
    pub user_agent: Option<String>,
    pub threshold: Option<ThresholdConfig>,
}

impl Effective {
    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            skip_audits: self.skip_audits.clone(),
            load: LoadOptions {
                timeout: Some(self.timeout),
                max_size: Some(self.max_size),
                allow_js: self.allow_js,
            },
            audit_timeout: self.audit_timeout,
        }
    }
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `webaudit.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|name| cur.join(name).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Absolute directory the config search starts from: `config_dir` (default
/// `.`) resolved against `cwd`, with `.` components dropped so the upward
/// walk reaches real ancestors.
pub fn start_dir(config_dir: Option<&str>, cwd: &Path) -> PathBuf {
    cwd.join(config_dir.unwrap_or("."))
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn config_error(path: &Path, reason: impl ToString) -> AuditError {
    AuditError::Config {
        path: path.to_string_lossy().to_string(),
        reason: reason.to_string(),
    }
}

/// Load `WebauditConfig` from the first config file present under `root`.
///
/// A missing file is `Ok(None)`; a file that fails to parse is an error.
pub fn load_config(root: &Path) -> Result<Option<WebauditConfig>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path)?;
        let cfg = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|e| config_error(&path, e))?
        } else {
            serde_yaml::from_str(&s).map_err(|e| config_error(&path, e))?
        };
        return Ok(Some(cfg));
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
///
/// Values from either source are validated the same way: an unknown format,
/// audit name, or threshold key is an error.
pub fn resolve_effective(cli: &CliOverrides) -> Result<Effective> {
    let cwd = std::env::current_dir()?;
    let root = detect_root(&start_dir(cli.config_dir.as_deref(), &cwd));
    let loaded = load_config(&root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let format = cli
        .format
        .clone()
        .or(cfg.format)
        .unwrap_or_else(|| "terminal".to_string());
    let formats = parse_formats(&format)?;

    let output_dir = PathBuf::from(
        cli.output_dir
            .clone()
            .or(cfg.output_dir)
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
    );

    let skip_audits = match (&cli.skip_audits, &cfg.skip_audits) {
        (Some(raw), _) => parse_audit_list(raw)?,
        (None, Some(list)) => parse_audit_list(&list.join(","))?,
        (None, None) => Vec::new(),
    };

    let threshold = match &cli.threshold {
        Some(raw) => Some(ThresholdConfig::from_json(raw)?),
        None => cfg.threshold,
    };

    Ok(Effective {
        root,
        config_found,
        format,
        formats,
        output_dir,
        skip_audits,
        allow_js: cli.allow_js.or(cfg.allow_js).unwrap_or(false),
        timeout: cli
            .timeout_ms
            .or(cfg.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOAD_TIMEOUT),
        max_size: cli.max_size.or(cfg.max_size).unwrap_or(DEFAULT_MAX_SIZE),
        audit_timeout: cli
            .audit_timeout_ms
            .or(cfg.audit_timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_AUDIT_TIMEOUT),
        user_agent: cli.user_agent.clone().or(cfg.user_agent),
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn overrides(root: &Path) -> CliOverrides {
        CliOverrides {
            config_dir: root.to_str().map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let eff = resolve_effective(&overrides(dir.path())).unwrap();
        assert!(!eff.config_found);
        assert_eq!(eff.format, "terminal");
        assert_eq!(eff.formats, vec![ReportFormat::Terminal]);
        assert_eq!(eff.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!(eff.skip_audits.is_empty());
        assert_eq!(eff.timeout, DEFAULT_LOAD_TIMEOUT);
        assert_eq!(eff.audit_timeout, DEFAULT_AUDIT_TIMEOUT);
        assert_eq!(eff.max_size, DEFAULT_MAX_SIZE);
        assert!(!eff.allow_js);
        assert!(eff.threshold.is_none());
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("webaudit.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
format = "all"
output_dir = "out"
skip_audits = ["pwa", "seo"]
audit_timeout_ms = 5000
[threshold]
critical = 0
serious = 3
    "#
        )
        .unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let eff = resolve_effective(&overrides(&nested)).unwrap();
        assert_eq!(eff.root, root.to_path_buf());
        assert!(eff.config_found);
        assert_eq!(eff.formats.len(), 3);
        assert_eq!(eff.output_dir, PathBuf::from("out"));
        assert_eq!(eff.skip_audits, vec![AuditType::Pwa, AuditType::Seo]);
        assert_eq!(eff.audit_timeout, Duration::from_millis(5000));
        let t = eff.threshold.unwrap();
        assert_eq!(t.critical, Some(0));
        assert_eq!(t.serious, Some(3));
        assert_eq!(t.minor, None);
    }

    #[test]
    fn test_default_start_walks_up_from_nested_cwd() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("webaudit.toml")).unwrap();
        writeln!(f, "{}", r#"format = "json""#).unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();

        // Resolve against an explicit cwd to avoid global CWD races
        let start = start_dir(None, &nested);
        assert_eq!(start, nested);
        assert_eq!(detect_root(&start), root.to_path_buf());
        let relative = start_dir(Some("./b"), &root.join("a"));
        assert_eq!(detect_root(&relative), root.to_path_buf());

        let cfg = load_config(&detect_root(&start)).unwrap().unwrap();
        assert_eq!(cfg.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_start_dir_keeps_absolute_config_dir() {
        let dir = tempdir().unwrap();
        let abs = dir.path().to_str().unwrap();
        assert_eq!(start_dir(Some(abs), Path::new("/elsewhere")), dir.path().to_path_buf());
    }

    #[test]
    fn test_load_yaml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("webaudit.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
format: json
allow_js: true
timeout_ms: 1000
skip_audits:
  - pwa
threshold:
  minor: 10
            "#
        )
        .unwrap();

        let cli = CliOverrides {
            format: Some("html".into()),
            skip_audits: Some("security".into()),
            threshold: Some(r#"{"critical":0}"#.into()),
            ..overrides(root)
        };
        let eff = resolve_effective(&cli).unwrap();
        assert_eq!(eff.formats, vec![ReportFormat::Html]);
        assert!(eff.allow_js);
        assert_eq!(eff.timeout, Duration::from_millis(1000));
        assert_eq!(eff.skip_audits, vec![AuditType::Security]);
        let t = eff.threshold.unwrap();
        assert_eq!(t.critical, Some(0));
        assert_eq!(t.minor, None);

        let opts = eff.audit_options();
        assert!(opts.load.allow_js);
        assert_eq!(opts.load.timeout, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_config_values_are_validated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("webaudit.toml"), "skip_audits = [\"speed\"]\n").unwrap();
        let err = resolve_effective(&overrides(root)).unwrap_err();
        assert!(matches!(err, AuditError::UnknownAuditType(ref s) if s == "speed"));

        fs::write(root.join("webaudit.toml"), "format = \"pdf\"\n").unwrap();
        assert!(matches!(
            resolve_effective(&overrides(root)),
            Err(AuditError::InvalidFormat(_))
        ));

        fs::write(root.join("webaudit.toml"), "[threshold]\nblocker = 1\n").unwrap();
        assert!(matches!(
            resolve_effective(&overrides(root)),
            Err(AuditError::Config { .. })
        ));
    }
}
