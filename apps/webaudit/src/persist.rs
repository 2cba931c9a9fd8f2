//! Writing rendered reports to disk.

use crate::error::{AuditError, Result};
use crate::output::ReportFormat;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Create `dir` and any missing parents.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write `content` to `path`, creating the parent directory when needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

/// Build `<host>[-<path>]_<timestamp>.<ext>` for a report of `url`.
///
/// Host and path have every non-alphanumeric character replaced by `-`; a
/// bare `/` path contributes nothing.
pub fn generate_filename(url: &str, ext: &str, now: DateTime<Utc>) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|source| AuditError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let unsafe_chars = Regex::new(r"(?i)[^a-z0-9]")?;
    let host = unsafe_chars.replace_all(parsed.host_str().unwrap_or("page"), "-");
    let path = unsafe_chars.replace_all(parsed.path(), "-");
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let stem = if path == "-" { host.into_owned() } else { format!("{}{}", host, path) };
    Ok(format!("{}_{}.{}", stem, stamp, ext))
}

/// Save a rendered report under `dir`, returning the written path.
pub fn save_report(url: &str, content: &str, dir: &Path, format: ReportFormat) -> Result<PathBuf> {
    let ext = format.extension().unwrap_or("json");
    let path = dir.join(generate_filename(url, ext, Utc::now())?);
    write_file(&path, content)?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(path)
}

/// Show `path` relative to `base` when possible.
pub fn display_path(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|p| !p.as_os_str().is_empty() && !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
    }

    #[test]
    fn test_filename_from_host_and_path() {
        let name = generate_filename("https://www.example.com/docs/intro", "json", at()).unwrap();
        assert_eq!(name, "www-example-com-docs-intro_2024-05-01T12-30-45-000Z.json");
    }

    #[test]
    fn test_filename_root_path_is_omitted() {
        let name = generate_filename("https://example.com/", "html", at()).unwrap();
        assert_eq!(name, "example-com_2024-05-01T12-30-45-000Z.html");
    }

    #[test]
    fn test_filename_rejects_bad_url() {
        assert!(matches!(
            generate_filename("not a url", "json", at()),
            Err(AuditError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_save_report_creates_nested_dir() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("reports/nested");
        let path = save_report("https://example.com/a", "{}", &out, ReportFormat::Json).unwrap();
        assert!(path.starts_with(&out));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        let shown = display_path(&path, dir.path());
        assert!(shown.starts_with("reports"));
    }
}
