//! CLI argument parsing via `clap`.

use crate::config::CliOverrides;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "webaudit",
    version,
    about = "Audit a web page for accessibility, performance, SEO, security, best practices, and PWA readiness",
    long_about = "webaudit loads a page once, runs every selected audit module against it concurrently, and renders a report.\n\nConfiguration precedence: CLI > webaudit.toml > defaults.",
    after_help = "Examples:\n  webaudit --url https://example.com\n  webaudit --url https://example.com --format all --output-dir reports\n  webaudit --url https://example.com --skip-audits pwa,seo\n  webaudit --url https://example.com --threshold '{\"critical\":0,\"serious\":5}'\n  webaudit audits",
    args_conflicts_with_subcommands = true
)]
/// Top-level CLI options.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
    #[arg(short, long, help = "URL to audit (required unless a subcommand is given)")]
    pub url: Option<String>,
    #[arg(short, long, help = "Output format: terminal|json|html|all (default: terminal)")]
    pub format: Option<String>,
    #[arg(short, long, help = "Directory for json/html reports (default: ./webaudit-reports)")]
    pub output_dir: Option<String>,
    #[arg(short, long, help = "Severity ceilings as JSON, e.g. '{\"critical\":0,\"serious\":5}'")]
    pub threshold: Option<String>,
    #[arg(short, long, help = "Comma-separated audits to skip (accessibility,performance,seo,security,best-practices,pwa)")]
    pub skip_audits: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Mark the page as allowing JavaScript")]
    pub allow_js: bool,
    #[arg(long, help = "Page load timeout in milliseconds (default: 30000)")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Maximum page size in bytes (default: 10485760)")]
    pub max_size: Option<u64>,
    #[arg(long, help = "Deadline for all audit modules in milliseconds (default: 60000)")]
    pub audit_timeout: Option<u64>,
    #[arg(long, help = "Directory to start config discovery from (default: current dir)")]
    pub config_dir: Option<String>,
    #[arg(long, help = "User-Agent header sent when loading the page")]
    pub user_agent: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable colored output")]
    pub no_color: bool,
    #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Enable debug logging on stderr")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available audits
    #[command(
        about = "List available audits",
        long_about = "Print every audit module with its category and description."
    )]
    Audits,
}

impl Cli {
    /// Settings that participate in config-file precedence.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_dir: self.config_dir.clone(),
            format: self.format.clone(),
            output_dir: self.output_dir.clone(),
            skip_audits: self.skip_audits.clone(),
            allow_js: self.allow_js.then_some(true),
            timeout_ms: self.timeout,
            max_size: self.max_size,
            audit_timeout_ms: self.audit_timeout,
            user_agent: self.user_agent.clone(),
            threshold: self.threshold.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "webaudit",
            "-u",
            "https://example.com",
            "--format",
            "json",
            "--skip-audits",
            "pwa,seo",
            "--allow-js",
            "--audit-timeout",
            "500",
        ])
        .unwrap();
        assert!(cli.cmd.is_none());
        assert_eq!(cli.url.as_deref(), Some("https://example.com"));
        let o = cli.overrides();
        assert_eq!(o.format.as_deref(), Some("json"));
        assert_eq!(o.skip_audits.as_deref(), Some("pwa,seo"));
        assert_eq!(o.allow_js, Some(true));
        assert_eq!(o.audit_timeout_ms, Some(500));
        assert_eq!(o.output_dir, None);
    }

    #[test]
    fn test_allow_js_absent_defers_to_config() {
        let cli = Cli::try_parse_from(["webaudit", "--url", "https://example.com"]).unwrap();
        assert_eq!(cli.overrides().allow_js, None);
    }

    #[test]
    fn test_audits_subcommand() {
        let cli = Cli::try_parse_from(["webaudit", "audits"]).unwrap();
        assert!(matches!(cli.cmd, Some(Commands::Audits)));
    }
}
