//! Security rules: transport, mixed content, response headers, password
//! fields, and reverse-tabnabbing links.
//!
//! Header checks issue a HEAD request for the page. When the probe fails
//! the headers captured at load time are used instead.

use super::{AuditContext, RuleModule};
use crate::dom;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::{AuditOutcome, Category, Issue, PendingCheck, Severity, Wcag, WcagLevel};
use crate::page::{Page, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const HEAD_TIMEOUT: Duration = Duration::from_secs(10);
const HEADERS_HELP: &str = "https://owasp.org/www-project-secure-headers/";
const HTTPS_REDIRECT: &str = "RewriteEngine On\nRewriteCond %{HTTPS} off\nRewriteRule ^(.*)$ https://%{HTTP_HOST}%{REQUEST_URI} [L,R=301]";

/// Headers that should be present, with the severity of their absence.
const SECURITY_HEADERS: &[(&str, Severity)] = &[
    ("Content-Security-Policy", Severity::Serious),
    ("Strict-Transport-Security", Severity::Serious),
    ("X-Frame-Options", Severity::Serious),
    ("X-Content-Type-Options", Severity::Moderate),
];

/// Security rule module.
pub struct SecurityRules {
    client: Client,
}

impl SecurityRules {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(HEAD_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn probe_headers(&self, page: &Page) -> HeaderMap {
        match self.client.head(&page.url).send().await {
            Ok(resp) => resp.headers().clone(),
            Err(e) => {
                debug!(url = %page.url, error = %e, "HEAD probe failed; using load-time headers");
                page.headers.clone()
            }
        }
    }
}

#[async_trait(?Send)]
impl RuleModule for SecurityRules {
    fn name(&self) -> &str {
        "Security"
    }

    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
        let page = ctx.page;
        let ids = ctx.ids;
        let mut out = AuditOutcome::new();

        match check_https(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "sec-https",
                "HTTPS Enabled",
                Category::Technical,
                "Page is served over HTTPS",
            )),
        }
        match check_mixed_content(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "sec-mixed",
                "No Mixed Content",
                Category::Technical,
                "No HTTP resources on HTTPS page",
            )),
        }
        let headers = self.probe_headers(page).await;
        out.issues.extend(check_security_headers(&headers, ids));
        match check_password_fields(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "sec-password",
                "Password Fields Secure",
                Category::Technical,
                "Password fields are on HTTPS",
            )),
        }
        match check_external_links(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "sec-ext-links",
                "External Links Secure",
                Category::Technical,
                "External links have security attributes",
            )),
        }
        Ok(out)
    }
}

fn security_maintained() -> Wcag {
    Wcag::new("4.1.1", WcagLevel::A, "Parsing", "Security is maintained")
}

pub(crate) fn check_https(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if page.is_https() {
        return None;
    }
    let help = "https://developers.google.com/web/fundamentals/security/encrypt-in-transit";
    Some(
        Issue::new(
            ids.contextual("sec", "https"),
            "sec-https",
            Severity::Critical,
            Category::Technical,
            "Page is not served over HTTPS",
        )
        .with_description("HTTPS encrypts data between browser and server")
        .with_help_url(help)
        .with_wcag(security_maintained())
        .with_element("body", "<body>...</body>", format!("URL: {}", page.url))
        .with_fix("Enable HTTPS on your web server", HTTPS_REDIRECT),
    )
}

pub(crate) fn check_mixed_content(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if !page.is_https() {
        return None;
    }
    let count: usize = [
        r#"script[src^="http://"]"#,
        r#"link[href^="http://"]"#,
        r#"img[src^="http://"]"#,
        r#"iframe[src^="http://"]"#,
    ]
    .iter()
    .map(|css| dom::select(&page.document, css).len())
    .sum();
    if count == 0 {
        return None;
    }
    let help = "https://developer.mozilla.org/en-US/docs/Web/Security/Mixed_content";
    Some(
        Issue::new(
            ids.contextual("sec", "mixed"),
            "sec-mixed",
            Severity::Serious,
            Category::Technical,
            format!("Found {} HTTP resource(s) on HTTPS page", count),
        )
        .with_description("Mixed content weakens HTTPS security")
        .with_help_url(help)
        .with_wcag(security_maintained())
        .with_element("body", "<body>...</body>", format!("{} mixed content resources", count))
        .with_fix(
            "Update all resource URLs to use HTTPS",
            "<!-- Change from -->\n<script src=\"http://example.com/script.js\"></script>\n<!-- To -->\n<script src=\"https://example.com/script.js\"></script>",
        ),
    )
}

fn header_fix_code(name: &str) -> &'static str {
    match name {
        "Content-Security-Policy" => {
            "Content-Security-Policy: default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'"
        }
        "Strict-Transport-Security" => "Strict-Transport-Security: max-age=31536000; includeSubDomains",
        "X-Frame-Options" => "X-Frame-Options: DENY",
        "X-Content-Type-Options" => "X-Content-Type-Options: nosniff",
        _ => "",
    }
}

/// One issue per missing security header.
pub(crate) fn check_security_headers(headers: &HeaderMap, ids: &IdGenerator) -> Vec<Issue> {
    SECURITY_HEADERS
        .iter()
        .filter(|(name, _)| headers.get(*name).is_none())
        .map(|(name, severity)| {
            let rule = format!("sec-header-{}", name.to_ascii_lowercase());
            Issue::new(
                ids.next(&rule),
                &rule,
                *severity,
                Category::Technical,
                format!("Missing {} header", name),
            )
            .with_description(format!(
                "The {} header helps protect against security vulnerabilities",
                name
            ))
            .with_help_url(HEADERS_HELP)
            .with_wcag(Wcag::new("4.1.1", WcagLevel::A, "Parsing", "Security headers are set"))
            .with_element("body", "<body>...</body>", format!("{} not found", name))
            .with_fix(
                format!("Add the {} header to your server configuration", name),
                header_fix_code(name),
            )
        })
        .collect()
}

pub(crate) fn check_password_fields(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if !page.is_http() {
        return None;
    }
    let fields = dom::select(&page.document, r#"input[type="password"]"#);
    let first = fields.first()?;
    let help = "https://owasp.org/www-project-web-security-testing-guide/";
    Some(
        Issue::new(
            ids.contextual("sec", "password-http"),
            "sec-password-http",
            Severity::Critical,
            Category::Technical,
            "Password fields on non-HTTPS page",
        )
        .with_description("Password fields should never be on HTTP pages")
        .with_help_url(help)
        .with_wcag(security_maintained())
        .with_element(r#"input[type="password"]"#, &dom::excerpt(first), "Password field over HTTP")
        .with_fix("Enable HTTPS for all pages with password fields", HTTPS_REDIRECT),
    )
}

pub(crate) fn check_external_links(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let unsafe_links: Vec<_> = dom::select(&page.document, r#"a[target="_blank"]"#)
        .into_iter()
        .filter(|a| {
            let rel = dom::attr(a, "rel").unwrap_or("");
            !rel.contains("noopener") || !rel.contains("noreferrer")
        })
        .collect();
    let first = unsafe_links.first()?;
    let help = "https://owasp.org/www-community/attacks/Reverse_Tabnabbing";
    Some(
        Issue::new(
            ids.contextual("sec", "ext-links"),
            "sec-ext-links",
            Severity::Moderate,
            Category::Technical,
            format!(
                "{} external link(s) missing rel=\"noopener noreferrer\"",
                unsafe_links.len()
            ),
        )
        .with_description("Links with target=\"_blank\" should prevent reverse tabnabbing")
        .with_help_url(help)
        .with_wcag(Wcag::new("4.1.2", WcagLevel::A, "Name, Role, Value", "Links are safe"))
        .with_element(
            r#"a[target="_blank"]"#,
            &dom::excerpt(first),
            format!("{} unsafe external links", unsafe_links.len()),
        )
        .with_fix(
            "Add rel=\"noopener noreferrer\" to all target=\"_blank\" links",
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">Link</a>"#,
        ),
    )
}
