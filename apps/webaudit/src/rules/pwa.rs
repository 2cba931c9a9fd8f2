//! Progressive Web App readiness: manifest, service worker, HTTPS, viewport,
//! and home screen metadata.

use super::{AuditContext, RuleModule};
use crate::dom;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::{AuditOutcome, Category, Issue, PendingCheck, Severity, Wcag, WcagLevel};
use crate::page::Page;
use async_trait::async_trait;

const APPLE_ICON_HELP: &str = "https://developer.apple.com/library/archive/documentation/AppleApplications/Reference/SafariWebContent/ConfiguringWebApplications/ConfiguringWebApplications.html";

/// PWA rule module.
pub struct PwaRules;

#[async_trait(?Send)]
impl RuleModule for PwaRules {
    fn name(&self) -> &str {
        "PWA"
    }

    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
        let page = ctx.page;
        let ids = ctx.ids;
        let mut out = AuditOutcome::new();

        let checks: [(Option<Issue>, PendingCheck); 6] = [
            (
                check_manifest(page, ids),
                PendingCheck::new("pwa-manifest", "Web App Manifest", Category::Document, "Web app manifest is linked"),
            ),
            (
                check_service_worker(page, ids),
                PendingCheck::new("pwa-service-worker", "Service Worker", Category::Technical, "Service worker is registered"),
            ),
            (
                check_https(page, ids),
                PendingCheck::new("pwa-https", "HTTPS", Category::Technical, "Page is served over HTTPS"),
            ),
            (
                check_viewport(page, ids),
                PendingCheck::new("pwa-viewport", "Viewport Meta Tag", Category::Document, "Viewport meta tag is properly configured"),
            ),
            (
                check_apple_touch_icon(page, ids),
                PendingCheck::new("pwa-apple-icon", "Apple Touch Icon", Category::Document, "Apple touch icon is specified"),
            ),
            (
                check_theme_color(page, ids),
                PendingCheck::new("pwa-theme-color", "Theme Color", Category::Document, "Theme color is specified"),
            ),
        ];
        for (issue, pass) in checks {
            match issue {
                Some(issue) => out.issue(issue),
                None => out.pass(pass),
            }
        }
        Ok(out)
    }
}

fn requirement(description: &str) -> Wcag {
    Wcag::new("N/A", WcagLevel::AAA, "PWA Requirement", description)
}

fn practice(description: &str) -> Wcag {
    Wcag::new("N/A", WcagLevel::AAA, "PWA Best Practice", description)
}

fn check_manifest(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if dom::select_first(&page.document, r#"link[rel="manifest"]"#).is_some() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("pwa", "no-manifest"),
            "manifest-missing",
            Severity::Serious,
            Category::Document,
            "Web app manifest not found",
        )
        .with_description("A web app manifest defines how the app appears to users and enables installation.")
        .with_help_url("https://web.dev/add-manifest/")
        .with_wcag(requirement("Web app manifest must be present"))
        .with_element("head", r#"<link rel="manifest" href="/manifest.json">"#, "No manifest link found")
        .with_fix(
            "Add a manifest link in the head section",
            "<head>\n  <link rel=\"manifest\" href=\"/manifest.json\">\n</head>",
        ),
    )
}

fn check_service_worker(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let registered = dom::select(&page.document, "script:not([src])")
        .iter()
        .any(|script| script.text().any(|t| t.contains("navigator.serviceWorker.register")));
    if registered {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("pwa", "no-service-worker"),
            "service-worker-missing",
            Severity::Serious,
            Category::Technical,
            "Service worker not registered",
        )
        .with_description("Service workers enable offline functionality and are a core requirement for Progressive Web Apps.")
        .with_help_url("https://web.dev/service-workers-cache-storage/")
        .with_wcag(requirement("Service worker should be registered"))
        .with_element("script", "<script>", "No service worker registration found")
        .with_fix(
            "Register a service worker",
            "if ('serviceWorker' in navigator) {\n  window.addEventListener('load', () => {\n    navigator.serviceWorker.register('/service-worker.js');\n  });\n}",
        ),
    )
}

fn check_https(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if page.is_https() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("pwa", "not-https"),
            "pwa-requires-https",
            Severity::Critical,
            Category::Technical,
            "PWA requires HTTPS",
        )
        .with_description("Service workers and many modern web APIs only work over secure connections.")
        .with_help_url("https://web.dev/why-https-matters/")
        .with_wcag(requirement("Must be served over HTTPS"))
        .with_element("html", &page.url, "Page is not served over HTTPS")
        .with_fix(
            "Serve your site over HTTPS",
            "// Use a hosting provider that supports HTTPS\n// or a free certificate from https://letsencrypt.org/",
        ),
    )
}

fn check_viewport(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let Some(viewport) = dom::select_first(&page.document, r#"meta[name="viewport"]"#) else {
        return Some(
            Issue::new(
                ids.contextual("pwa", "no-viewport"),
                "viewport-missing",
                Severity::Serious,
                Category::Document,
                "Viewport meta tag missing",
            )
            .with_description("The viewport meta tag makes the app display correctly on mobile devices.")
            .with_help_url("https://web.dev/viewport/")
            .with_wcag(requirement("Viewport meta tag must be present"))
            .with_element(
                "head",
                r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
                "No viewport meta tag found",
            )
            .with_fix(
                "Add viewport meta tag to the head",
                "<head>\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n</head>",
            ),
        );
    };
    let content = dom::attr(&viewport, "content").unwrap_or("");
    if content.contains("width=device-width") {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("pwa", "viewport-invalid"),
            "viewport-invalid",
            Severity::Moderate,
            Category::Document,
            "Viewport meta tag missing width=device-width",
        )
        .with_description("The viewport should include width=device-width for proper responsive behavior.")
        .with_help_url("https://web.dev/viewport/")
        .with_wcag(practice("Viewport should be properly configured"))
        .with_element(r#"meta[name="viewport"]"#, &dom::excerpt(&viewport), "Viewport missing width=device-width")
        .with_fix(
            "Update viewport content attribute",
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
        ),
    )
}

fn check_apple_touch_icon(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if dom::select_first(&page.document, r#"link[rel="apple-touch-icon"]"#).is_some() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("pwa", "no-apple-icon"),
            "apple-touch-icon-missing",
            Severity::Minor,
            Category::Document,
            "Apple touch icon not specified",
        )
        .with_description("Apple touch icons are used when the app is added to an iOS home screen. Recommended size is 180x180px.")
        .with_help_url(APPLE_ICON_HELP)
        .with_wcag(practice("Provide Apple touch icon"))
        .with_element(
            "head",
            r#"<link rel="apple-touch-icon" href="/icons/apple-touch-icon-180x180.png">"#,
            "No apple-touch-icon link found",
        )
        .with_fix(
            "Add apple-touch-icon link",
            "<head>\n  <link rel=\"apple-touch-icon\" sizes=\"180x180\" href=\"/icons/apple-touch-icon-180x180.png\">\n</head>",
        ),
    )
}

fn check_theme_color(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if dom::select_first(&page.document, r#"meta[name="theme-color"]"#).is_some() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("pwa", "no-theme-color"),
            "theme-color-missing",
            Severity::Minor,
            Category::Document,
            "Theme color not specified",
        )
        .with_description("The theme-color meta tag customizes the browser UI color on mobile devices.")
        .with_help_url("https://web.dev/themed-omnibox/")
        .with_wcag(practice("Provide theme color"))
        .with_element("head", r##"<meta name="theme-color" content="#ffffff">"##, "No theme-color meta tag found")
        .with_fix(
            "Add theme-color meta tag",
            "<head>\n  <meta name=\"theme-color\" content=\"#1a73e8\">\n</head>",
        ),
    )
}
