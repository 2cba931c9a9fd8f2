//! webaudit CLI binary entry point.
//! Resolves settings, runs the audits, writes reports, and applies the
//! threshold gate to the exit code.

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use std::fmt::Display;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use webaudit::audits::{audit_info, available_audits};
use webaudit::cli::{Cli, Commands};
use webaudit::config::{self, Effective};
use webaudit::models::AuditReport;
use webaudit::output::{self, ReportFormat};
use webaudit::threshold::{check_thresholds, format_threshold_violations};
use webaudit::{page, persist, utils, Auditor};

fn fail(msg: impl Display) -> ! {
    eprintln!("{} {}", utils::error_prefix(), msg);
    std::process::exit(1);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "webaudit=debug" } else { "webaudit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(utils::use_colors())
        .init();
}

fn print_audits(color: bool) {
    for audit in available_audits() {
        let info = audit_info(audit);
        let key = format!("{:<16}", audit.as_str());
        let key = if color { key.bold().to_string() } else { key };
        println!("{} {} ({})", key, info.name, info.category);
        println!("  {}", info.description);
    }
}

fn print_start(url: &str, eff: &Effective) {
    println!("🔍 Starting web audit...");
    println!("  URL: {}", url);
    println!("  Format: {}", eff.format);
    println!("  Allow JS: {}", if eff.allow_js { "Yes" } else { "No" });
    if !eff.skip_audits.is_empty() {
        let names: Vec<&str> = eff.skip_audits.iter().map(|a| a.as_str()).collect();
        println!("  Skipping: {}", names.join(", "));
    }
    if let Some(t) = &eff.threshold {
        println!("  Threshold: {}", serde_json::to_string(t).unwrap_or_default());
    }
}

fn generate_reports(report: &AuditReport, eff: &Effective, color: bool) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    for &format in &eff.formats {
        if format == ReportFormat::Terminal {
            println!("\n📊 Report:\n");
            output::render_report(report, format, eff.threshold.as_ref(), color)?;
            continue;
        }
        let label = format.as_str().to_uppercase();
        println!("\n📝 Generating {} report...", label);
        let content = output::render_report(report, format, eff.threshold.as_ref(), color)?
            .with_context(|| format!("{} renderer returned no content", label))?;
        let path = persist::save_report(&report.url, &content, &eff.output_dir, format)
            .with_context(|| format!("writing {} report to {}", label, eff.output_dir.display()))?;
        println!("✓ {} report saved: {}", label, persist::display_path(&path, &cwd));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.no_color {
        utils::disable_colors();
    }
    let color = utils::use_colors();
    init_tracing(cli.verbose);

    if let Some(Commands::Audits) = cli.cmd {
        print_audits(color);
        return;
    }

    let raw_url = match cli.url.as_deref() {
        Some(u) => u,
        None => fail("Missing required --url. Run with --help for usage."),
    };
    let url = page::validate_url(raw_url).unwrap_or_else(|e| fail(e));
    let eff = config::resolve_effective(&cli.overrides()).unwrap_or_else(|e| fail(e));
    if eff.config_found {
        eprintln!("{} Using config from {}", utils::info_prefix(), eff.root.display());
    } else {
        tracing::debug!(root = %eff.root.display(), "no webaudit config found; using defaults");
    }
    if eff.allow_js {
        eprintln!(
            "{} Pages are analyzed statically; --allow-js is recorded but scripts are not executed.",
            utils::note_prefix()
        );
    }

    print_start(url.as_str(), &eff);

    let auditor = match eff.user_agent.as_deref() {
        Some(ua) => Auditor::with_user_agent(ua),
        None => Auditor::with_defaults(),
    }
    .unwrap_or_else(|e| fail(format!("Failed to initialize auditor: {}", e)));

    println!("\n⚙️  Running audits...");
    let report = match auditor.run_audits(url.as_str(), &eff.audit_options()).await {
        Ok(r) => r,
        Err(e) => fail(format!("Failed to run audits: {}", e)),
    };
    println!("✓ Audits completed");

    if let Err(e) = generate_reports(&report, &eff, color) {
        fail(format!("Failed to generate reports: {:#}", e));
    }

    output::print_summary(&report, color);

    if eff.threshold.is_some() {
        let result = check_thresholds(&report, eff.threshold.as_ref());
        if let Some(text) = format_threshold_violations(&result) {
            println!("\n{}", if color { text.red().to_string() } else { text });
            fail("❌ Build failed due to threshold violations");
        }
        println!("\n✓ All threshold checks passed");
    }
    println!("\n✓ Audit completed successfully");
}
