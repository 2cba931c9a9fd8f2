use std::collections::HashSet;
use std::time::Duration;

use webaudit::audits::AuditType;
use webaudit::models::{Category, Severity};
use webaudit::{AuditError, AuditOptions, Auditor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Shop</title>
  <script src="/app.js"></script>
</head>
<body>
  <h1>Welcome</h1>
  <h3>Skipped a level</h3>
  <img src="/hero.png">
  <a href="https://elsewhere.example" target="_blank">Partner</a>
  <marquee>Sale!</marquee>
</body>
</html>"#;

async fn serve(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_full_run_against_mock_server() {
    let server = serve(PAGE).await;
    let url = format!("{}/shop", server.uri());
    let auditor = Auditor::with_defaults().unwrap();
    let report = auditor.run_audits(&url, &AuditOptions::default()).await.unwrap();

    assert_eq!(report.url, url);
    assert!(report.incomplete.is_empty());
    assert_eq!(report.summary.total, report.issues.len());
    assert_eq!(report.summary.by_severity.sum(), report.summary.total);
    assert_eq!(report.summary.passed, report.passed.len());
    assert!(report.summary.by_severity.get(Severity::Critical) > 0);

    let ids: HashSet<&str> = report.issues.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids.len(), report.issues.len());

    let rules: HashSet<&str> = report.issues.iter().map(|i| i.rule_id.as_str()).collect();
    for expected in ["image-alt", "html-has-lang", "heading-order", "marquee", "sec-https"] {
        assert!(rules.contains(expected), "missing {expected}");
    }
    assert!(report
        .issues
        .iter()
        .any(|i| i.category == Category::Images));
}

#[tokio::test]
async fn test_skip_list_limits_modules() {
    let server = serve(PAGE).await;
    let url = format!("{}/shop", server.uri());
    let auditor = Auditor::with_defaults().unwrap();
    let options = AuditOptions {
        skip_audits: vec![
            AuditType::Accessibility,
            AuditType::Performance,
            AuditType::Security,
            AuditType::BestPractices,
            AuditType::Pwa,
        ],
        ..AuditOptions::default()
    };
    let report = auditor.run_audits(&url, &options).await.unwrap();
    assert!(!report.passed.is_empty());
    assert!(report.passed.iter().all(|c| c.id.starts_with("seo-")));
    assert!(report.issues.iter().all(|i| i.rule_id.starts_with("seo-")));
}

#[tokio::test]
async fn test_missing_page_aborts_run() {
    let server = serve(PAGE).await;
    let auditor = Auditor::with_defaults().unwrap();
    let options = AuditOptions {
        audit_timeout: Duration::from_secs(5),
        ..AuditOptions::default()
    };
    let err = auditor
        .run_audits(&format!("{}/missing", server.uri()), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::PageLoad { .. }));
}
