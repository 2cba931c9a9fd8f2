//! Audit orchestration.
//!
//! Loads one page, runs every selected rule module against it concurrently,
//! and folds their outputs into an [`AuditReport`].
//!
//! Failure handling has two layers:
//! - a module that returns `Err` or panics is recorded in `incomplete` and
//!   the rest of the run carries on;
//! - the whole batch runs under one deadline; when it expires the run fails
//!   with [`AuditError::Timeout`] and the in-flight module futures are
//!   dropped. Rule modules mostly do synchronous DOM work inside a single
//!   poll, which the timer cannot interrupt, so the batch's wall-clock time
//!   is also checked once it settles; an overrun there fails the run too.

use crate::audits::AuditType;
use crate::error::{AuditError, Result};
use crate::formatter::{format_results, merge_audit_results};
use crate::ids::IdGenerator;
use crate::models::{AuditOutcome, AuditReport, Category, Issue, Severity, Wcag, WcagLevel};
use crate::page::{HttpPageLoader, LoadOptions, PageLoader};
use crate::rules::{AuditContext, RuleModule, RuleRegistry};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_millis(60_000);

#[derive(Debug, Clone)]
/// Options for one orchestration run.
pub struct AuditOptions {
    /// Audit types to leave out.
    pub skip_audits: Vec<AuditType>,
    /// Forwarded to the page loader.
    pub load: LoadOptions,
    /// Upper bound on the concurrent rule-module batch.
    pub audit_timeout: Duration,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            skip_audits: Vec::new(),
            load: LoadOptions::default(),
            audit_timeout: DEFAULT_AUDIT_TIMEOUT,
        }
    }
}

/// The six audit types minus `skip`, in dispatch order.
pub fn selected_audits(skip: &[AuditType]) -> Vec<AuditType> {
    AuditType::ALL
        .iter()
        .copied()
        .filter(|a| !skip.contains(a))
        .collect()
}

/// Outcome of a single module invocation, success or captured failure.
struct ModuleRun {
    audit: AuditType,
    result: std::result::Result<AuditOutcome, String>,
}

/// Loads pages and dispatches rule modules.
pub struct Auditor {
    loader: Box<dyn PageLoader>,
    registry: RuleRegistry,
}

impl Auditor {
    pub fn new(loader: impl PageLoader + 'static, registry: RuleRegistry) -> Self {
        Self {
            loader: Box::new(loader),
            registry,
        }
    }

    /// HTTP loader and the built-in rule modules.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(HttpPageLoader::new()?, RuleRegistry::with_defaults()?))
    }

    /// Same as [`Auditor::with_defaults`] with a custom `User-Agent`.
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        Ok(Self::new(
            HttpPageLoader::with_user_agent(user_agent)?,
            RuleRegistry::with_defaults()?,
        ))
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Audit `url` with every type not listed in `options.skip_audits`.
    ///
    /// Fails when the page cannot be loaded, when a selected type has no
    /// registered module, or when the module batch exceeds
    /// `options.audit_timeout`. Module failures do not fail the run.
    pub async fn run_audits(&self, url: &str, options: &AuditOptions) -> Result<AuditReport> {
        let start = chrono::Utc::now().timestamp_millis();
        let selected = selected_audits(&options.skip_audits);
        let modules = selected
            .iter()
            .map(|&audit| {
                self.registry
                    .get(audit)
                    .map(|m| (audit, m))
                    .ok_or(AuditError::UnregisteredAudit(audit))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(url, audits = ?selected, "starting audit");
        let page = self.loader.load(url, &options.load).await?;
        debug!(url = %page.url, status = page.status, bytes = page.html.len(), "page loaded");

        let ids = IdGenerator::new();
        let ctx = AuditContext { page: &page, ids: &ids };
        let batch = join_all(
            modules
                .into_iter()
                .map(|(audit, module)| run_module(audit, module, &ctx)),
        );
        let deadline_error = || AuditError::Timeout {
            timeout_ms: options.audit_timeout.as_millis() as u64,
        };
        let batch_started = Instant::now();
        let runs = tokio::time::timeout(options.audit_timeout, batch)
            .await
            .map_err(|_| deadline_error())?;
        if batch_started.elapsed() > options.audit_timeout {
            warn!(
                elapsed_ms = batch_started.elapsed().as_millis() as u64,
                "audit batch overran its deadline"
            );
            return Err(deadline_error());
        }

        let mut outcomes = Vec::with_capacity(runs.len());
        let mut incomplete = Vec::new();
        for run in runs {
            match run.result {
                Ok(outcome) => outcomes.push(outcome),
                Err(message) => {
                    warn!(audit = %run.audit, error = %message, "audit module failed");
                    incomplete.push(audit_error_issue(run.audit, &message));
                }
            }
        }
        let merged = merge_audit_results(outcomes);

        let end = chrono::Utc::now().timestamp_millis().max(start);
        let report = format_results(url, start, end, merged.issues, merged.passed, incomplete);
        info!(
            url,
            issues = report.summary.total,
            passed = report.summary.passed,
            incomplete = report.incomplete.len(),
            duration_ms = report.duration,
            "audit complete"
        );
        Ok(report)
    }

    /// Audit `url` with exactly the listed types.
    pub async fn run_specific_audits(
        &self,
        url: &str,
        audits: &[AuditType],
        options: &AuditOptions,
    ) -> Result<AuditReport> {
        let options = AuditOptions {
            skip_audits: AuditType::ALL
                .iter()
                .copied()
                .filter(|a| !audits.contains(a))
                .collect(),
            ..options.clone()
        };
        self.run_audits(url, &options).await
    }
}

async fn run_module(audit: AuditType, module: &dyn RuleModule, ctx: &AuditContext<'_>) -> ModuleRun {
    let started = Instant::now();
    let result = match AssertUnwindSafe(module.audit(ctx)).catch_unwind().await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => Err(panic_message(panic.as_ref())),
    };
    debug!(
        audit = %audit,
        module = module.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "module finished"
    );
    ModuleRun { audit, result }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Synthetic issue standing in for a module that did not complete.
fn audit_error_issue(audit: AuditType, error: &str) -> Issue {
    Issue::new(
        format!("audit-error-{}", audit),
        "audit-error",
        Severity::Serious,
        Category::Technical,
        format!("{} audit failed", audit),
    )
    .with_description(format!("The {} audit could not complete: {}", audit, error))
    .with_wcag(Wcag::new("N/A", WcagLevel::A, "Audit Error", "Audit could not complete"))
    .with_element("", "", error)
    .with_fix("Check the error message for details", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PendingCheck;
    use crate::page::Page;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StubLoader {
        fail: bool,
    }

    #[async_trait(?Send)]
    impl PageLoader for StubLoader {
        async fn load(&self, url: &str, _options: &LoadOptions) -> Result<Page> {
            if self.fail {
                return Err(AuditError::PageLoad {
                    url: url.to_string(),
                    reason: "HTTP 500 Internal Server Error".to_string(),
                });
            }
            Ok(Page::from_html(url, "<html><body><p>hi</p></body></html>"))
        }
    }

    enum Behavior {
        Report,
        Fail,
        Panic,
        Hang,
        Busy(Duration),
    }

    struct StubModule {
        audit: AuditType,
        behavior: Behavior,
        calls: Rc<RefCell<Vec<AuditType>>>,
    }

    #[async_trait(?Send)]
    impl RuleModule for StubModule {
        fn name(&self) -> &str {
            self.audit.as_str()
        }

        async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
            self.calls.borrow_mut().push(self.audit);
            match self.behavior {
                Behavior::Report => {
                    let mut out = AuditOutcome::new();
                    out.issue(Issue::new(
                        ctx.ids.next(self.audit.as_str()),
                        self.audit.as_str(),
                        Severity::Minor,
                        Category::Technical,
                        "stub issue",
                    ));
                    out.pass(PendingCheck::new(self.audit.as_str(), "stub", Category::Technical, "ok"));
                    Ok(out)
                }
                Behavior::Fail => Err(AuditError::Rule("boom".to_string())),
                Behavior::Panic => panic!("module exploded"),
                Behavior::Busy(d) => {
                    std::thread::sleep(d);
                    Ok(AuditOutcome::new())
                }
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(AuditOutcome::new())
                }
            }
        }
    }

    fn auditor(
        behavior: impl Fn(AuditType) -> Behavior,
        loader_fails: bool,
    ) -> (Auditor, Rc<RefCell<Vec<AuditType>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = RuleRegistry::new();
        for audit in AuditType::ALL {
            registry.register(
                audit,
                StubModule {
                    audit,
                    behavior: behavior(audit),
                    calls: Rc::clone(&calls),
                },
            );
        }
        (Auditor::new(StubLoader { fail: loader_fails }, registry), calls)
    }

    #[tokio::test]
    async fn test_all_modules_merge_in_dispatch_order() {
        let (auditor, _) = auditor(|_| Behavior::Report, false);
        let report = auditor
            .run_audits("https://example.com", &AuditOptions::default())
            .await
            .unwrap();
        let rules: Vec<&str> = report.issues.iter().map(|i| i.rule_id.as_str()).collect();
        assert_eq!(
            rules,
            vec!["accessibility", "performance", "seo", "security", "best-practices", "pwa"]
        );
        assert_eq!(report.passed.len(), 6);
        assert_eq!(report.summary.total, 6);
        assert_eq!(report.summary.passed, 6);
        assert!(report.incomplete.is_empty());
        let ids: std::collections::HashSet<&str> = report.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 6);
    }

    #[tokio::test]
    async fn test_one_failing_module_is_isolated() {
        let (auditor, _) = auditor(
            |a| if a == AuditType::Seo { Behavior::Fail } else { Behavior::Report },
            false,
        );
        let report = auditor
            .run_audits("https://example.com", &AuditOptions::default())
            .await
            .unwrap();
        assert_eq!(report.incomplete.len(), 1);
        let err = &report.incomplete[0];
        assert_eq!(err.rule_id, "audit-error");
        assert_eq!(err.id, "audit-error-seo");
        assert_eq!(err.severity, Severity::Serious);
        assert_eq!(err.message, "seo audit failed");
        assert_eq!(err.element.failure_summary, "Rule module error: boom");
        assert_eq!(report.issues.len(), 5);
        assert_eq!(report.passed.len(), 5);
        assert_eq!(report.summary.total, 5);
    }

    #[tokio::test]
    async fn test_panicking_module_is_isolated() {
        let (auditor, _) = auditor(
            |a| if a == AuditType::Pwa { Behavior::Panic } else { Behavior::Report },
            false,
        );
        let report = auditor
            .run_audits("https://example.com", &AuditOptions::default())
            .await
            .unwrap();
        assert_eq!(report.incomplete.len(), 1);
        assert_eq!(report.incomplete[0].element.failure_summary, "panicked: module exploded");
        assert_eq!(report.issues.len(), 5);
    }

    #[tokio::test]
    async fn test_skipped_modules_are_never_invoked() {
        let (auditor, calls) = auditor(|_| Behavior::Report, false);
        let options = AuditOptions {
            skip_audits: vec![AuditType::Pwa, AuditType::Security],
            ..Default::default()
        };
        let report = auditor.run_audits("https://example.com", &options).await.unwrap();
        let called = calls.borrow();
        assert!(!called.contains(&AuditType::Pwa));
        assert!(!called.contains(&AuditType::Security));
        assert_eq!(called.len(), 4);
        assert!(report
            .issues
            .iter()
            .all(|i| i.rule_id != "pwa" && i.rule_id != "security"));
        assert!(report.passed.iter().all(|p| p.id != "pwa" && p.id != "security"));
    }

    #[tokio::test]
    async fn test_specific_audits_run_only_listed_types() {
        let (auditor, calls) = auditor(|_| Behavior::Report, false);
        let report = auditor
            .run_specific_audits("https://example.com", &[AuditType::Seo], &AuditOptions::default())
            .await
            .unwrap();
        assert_eq!(*calls.borrow(), vec![AuditType::Seo]);
        assert_eq!(report.issues.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_deadline_fails_the_run() {
        let (auditor, _) = auditor(
            |a| if a == AuditType::Performance { Behavior::Hang } else { Behavior::Report },
            false,
        );
        let options = AuditOptions {
            audit_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let err = auditor
            .run_audits("https://example.com", &options)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Audit timed out after 50ms");
    }

    #[tokio::test]
    async fn test_synchronous_overrun_fails_the_run() {
        let (auditor, _) = auditor(
            |a| {
                if a == AuditType::Seo {
                    Behavior::Busy(Duration::from_millis(120))
                } else {
                    Behavior::Report
                }
            },
            false,
        );
        let options = AuditOptions {
            audit_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let err = auditor
            .run_audits("https://example.com", &options)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Audit timed out after 50ms");
    }

    #[tokio::test]
    async fn test_load_failure_is_fatal() {
        let (auditor, calls) = auditor(|_| Behavior::Report, true);
        let err = auditor
            .run_audits("https://example.com", &AuditOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::PageLoad { .. }));
        assert!(calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_missing_module_is_fatal() {
        let auditor = Auditor::new(StubLoader { fail: false }, RuleRegistry::new());
        let err = auditor
            .run_audits("https://example.com", &AuditOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::UnregisteredAudit(AuditType::Accessibility)));
    }

    #[test]
    fn test_selected_audits_keep_dispatch_order() {
        assert_eq!(
            selected_audits(&[AuditType::Seo]),
            vec![
                AuditType::Accessibility,
                AuditType::Performance,
                AuditType::Security,
                AuditType::BestPractices,
                AuditType::Pwa,
            ]
        );
    }
}
