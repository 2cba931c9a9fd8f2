//! Performance heuristics over the static document: resource counts, image
//! loading, script blocking, layout stability, and font delivery.

use super::{AuditContext, RuleModule};
use crate::dom;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::{AuditOutcome, Category, Issue, PendingCheck, Severity, Wcag, WcagLevel};
use crate::page::Page;
use async_trait::async_trait;
use regex::Regex;

const MAX_SCRIPTS: usize = 20;
const MAX_STYLESHEETS: usize = 5;
const MAX_INLINE_HEAD_SCRIPTS: usize = 3;
const MAX_BLOCKING_CSS: usize = 2;
/// Images after this many are treated as below the fold.
const EAGER_IMAGE_COUNT: usize = 3;

/// Performance rule module.
pub struct PerformanceRules;

#[async_trait(?Send)]
impl RuleModule for PerformanceRules {
    fn name(&self) -> &str {
        "Performance"
    }

    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
        let page = ctx.page;
        let ids = ctx.ids;
        let mut out = AuditOutcome::new();

        let groups: [(Vec<Issue>, PendingCheck); 6] = [
            (
                check_resources(page, ids),
                PendingCheck::new("perf-resources", "Resource Count", Category::Technical, "Script and stylesheet counts are reasonable"),
            ),
            (
                check_images(page, ids)?,
                PendingCheck::new("perf-images", "Image Optimization", Category::Images, "Images declare dimensions, lazy loading, and modern formats"),
            ),
            (
                check_javascript(page, ids),
                PendingCheck::new("perf-javascript", "JavaScript Loading", Category::Technical, "Scripts do not block rendering"),
            ),
            (
                check_layout_shift(page, ids),
                PendingCheck::new("perf-cls", "Layout Stability", Category::Technical, "Embedded content reserves space"),
            ),
            (
                check_render_blocking(page, ids),
                PendingCheck::new("perf-render-blocking", "Render-Blocking CSS", Category::Technical, "Few render-blocking stylesheets"),
            ),
            (
                check_fonts(page, ids),
                PendingCheck::new("perf-fonts", "Font Loading", Category::Technical, "Web fonts are preloaded and preconnected"),
            ),
        ];
        for (issues, pass) in groups {
            if issues.is_empty() {
                out.pass(pass);
            } else {
                out.issues.extend(issues);
            }
        }
        Ok(out)
    }
}

fn perf_practice(description: &str) -> Wcag {
    Wcag::new("N/A", WcagLevel::AAA, "Performance Best Practice", description)
}

fn check_resources(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    let scripts = dom::select(&page.document, "script[src]");
    if scripts.len() > MAX_SCRIPTS {
        issues.push(
            Issue::new(
                ids.contextual("perf", "scripts"),
                "excessive-scripts",
                Severity::Moderate,
                Category::Technical,
                format!("Page loads {} external scripts", scripts.len()),
            )
            .with_description("Each external script adds a request and parse cost")
            .with_help_url("https://web.dev/reduce-network-payloads-using-text-compression/")
            .with_wcag(perf_practice("Limit external scripts"))
            .with_element("script[src]", &dom::excerpt(&scripts[0]), format!("{} scripts (max {})", scripts.len(), MAX_SCRIPTS))
            .with_fix("Bundle scripts and remove unused dependencies", ""),
        );
    }
    let sheets = dom::select(&page.document, r#"link[rel="stylesheet"]"#);
    if sheets.len() > MAX_STYLESHEETS {
        issues.push(
            Issue::new(
                ids.contextual("perf", "stylesheets"),
                "excessive-stylesheets",
                Severity::Moderate,
                Category::Technical,
                format!("Page loads {} external stylesheets", sheets.len()),
            )
            .with_description("Each stylesheet is a render-blocking request")
            .with_help_url("https://web.dev/extract-critical-css/")
            .with_wcag(perf_practice("Limit external stylesheets"))
            .with_element(r#"link[rel="stylesheet"]"#, &dom::excerpt(&sheets[0]), format!("{} stylesheets (max {})", sheets.len(), MAX_STYLESHEETS))
            .with_fix("Combine stylesheets and inline critical CSS", ""),
        );
    }
    issues
}

fn check_images(page: &Page, ids: &IdGenerator) -> Result<Vec<Issue>> {
    let legacy = Regex::new(r"(?i)\.(jpe?g|png)$")?;
    let mut issues = Vec::new();
    for (index, img) in dom::select(&page.document, "img").iter().enumerate() {
        let src = dom::attr(img, "src").unwrap_or("");
        let selector = dom::build_selector(img);
        let html = dom::excerpt(img);
        if dom::attr(img, "width").is_none() || dom::attr(img, "height").is_none() {
            issues.push(
                Issue::new(
                    ids.contextual("perf", "img-no-dimensions"),
                    "image-missing-dimensions",
                    Severity::Moderate,
                    Category::Images,
                    "Image missing width and height attributes",
                )
                .with_description("Images without dimensions cause layout shifts as they load")
                .with_help_url("https://web.dev/optimize-cls/")
                .with_wcag(perf_practice("Reserve space for images"))
                .with_element(&selector, &html, "Image has no explicit width/height")
                .with_fix(
                    "Add width and height attributes to the image",
                    format!(r#"<img src="{}" width="800" height="600" alt="...">"#, src),
                ),
            );
        }
        if dom::attr(img, "loading").is_none() && index >= EAGER_IMAGE_COUNT {
            issues.push(
                Issue::new(
                    ids.contextual("perf", "img-no-lazy"),
                    "image-no-lazy-loading",
                    Severity::Minor,
                    Category::Images,
                    "Below-fold image not using lazy loading",
                )
                .with_description("Lazy loading defers offscreen images until they are needed")
                .with_help_url("https://web.dev/lazy-loading-images/")
                .with_wcag(perf_practice("Defer offscreen images"))
                .with_element(&selector, &html, "Image does not use loading='lazy' attribute")
                .with_fix(
                    "Add loading='lazy' attribute to below-fold images",
                    format!(r#"<img src="{}" loading="lazy" alt="...">"#, src),
                ),
            );
        }
        if !src.is_empty() && legacy.is_match(src) {
            issues.push(
                Issue::new(
                    ids.contextual("perf", "img-format"),
                    "image-legacy-format",
                    Severity::Minor,
                    Category::Images,
                    "Image uses legacy format",
                )
                .with_description("WebP and AVIF are typically much smaller than JPEG or PNG")
                .with_help_url("https://web.dev/serve-images-webp/")
                .with_wcag(perf_practice("Serve modern image formats"))
                .with_element(&selector, &html, format!("Legacy format: {}", src))
                .with_fix(
                    "Serve WebP or AVIF with a fallback",
                    format!(
                        "<picture>\n  <source srcset=\"image.webp\" type=\"image/webp\">\n  <img src=\"{}\" alt=\"...\">\n</picture>",
                        src
                    ),
                ),
            );
        }
    }
    Ok(issues)
}

fn check_javascript(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    for script in dom::select(&page.document, "script[src]") {
        let blocking = dom::attr(&script, "async").is_none()
            && dom::attr(&script, "defer").is_none()
            && dom::attr(&script, "type") != Some("module");
        if !blocking {
            continue;
        }
        let src = dom::attr(&script, "src").unwrap_or("");
        issues.push(
            Issue::new(
                ids.contextual("perf", "script-sync"),
                "script-blocking",
                Severity::Serious,
                Category::Technical,
                "Render-blocking JavaScript detected",
            )
            .with_description("Synchronous scripts pause HTML parsing until they download and run")
            .with_help_url("https://web.dev/render-blocking-resources/")
            .with_wcag(perf_practice("Avoid blocking scripts"))
            .with_element(&dom::build_selector(&script), &dom::excerpt(&script), format!("Script {} loads synchronously", src))
            .with_fix(
                "Add async or defer to the script tag",
                format!(r#"<script src="{}" defer></script>"#, src),
            ),
        );
    }
    let inline = dom::select(&page.document, "head script:not([src])");
    if inline.len() > MAX_INLINE_HEAD_SCRIPTS {
        issues.push(
            Issue::new(
                ids.contextual("perf", "inline-scripts"),
                "excessive-inline-scripts",
                Severity::Moderate,
                Category::Technical,
                format!("{} inline scripts in <head>", inline.len()),
            )
            .with_description("Inline head scripts run before first paint")
            .with_help_url("https://web.dev/render-blocking-resources/")
            .with_wcag(perf_practice("Keep the head lean"))
            .with_element("head script", &dom::excerpt(&inline[0]), format!("{} inline scripts", inline.len()))
            .with_fix("Move non-critical inline scripts to the end of the body or an external deferred file", ""),
        );
    }
    issues
}

fn check_layout_shift(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    for frame in dom::select(&page.document, "iframe") {
        if dom::attr(&frame, "width").is_some() && dom::attr(&frame, "height").is_some() {
            continue;
        }
        issues.push(
            Issue::new(
                ids.contextual("perf", "iframe-no-dimensions"),
                "iframe-missing-dimensions",
                Severity::Moderate,
                Category::Technical,
                "Iframe missing width and height attributes",
            )
            .with_description("Embeds without reserved space shift content when they load")
            .with_help_url("https://web.dev/optimize-cls/")
            .with_wcag(perf_practice("Reserve space for embeds"))
            .with_element(&dom::build_selector(&frame), &dom::excerpt(&frame), "Iframe has no explicit width/height")
            .with_fix("Add width and height to the iframe", r#"<iframe src="..." width="560" height="315"></iframe>"#),
        );
    }
    let fonts = dom::select(&page.document, r#"link[rel="stylesheet"][href*="fonts"]"#);
    if let Some(first) = fonts.first() {
        issues.push(
            Issue::new(
                ids.contextual("perf", "font-display"),
                "font-no-display",
                Severity::Minor,
                Category::Technical,
                "Web fonts may cause layout shifts",
            )
            .with_description("Without font-display, text may be invisible or reflow when fonts arrive")
            .with_help_url("https://web.dev/font-display/")
            .with_wcag(perf_practice("Control font swapping"))
            .with_element(r#"link[href*="fonts"]"#, &dom::excerpt(first), "Font stylesheet without font-display control")
            .with_fix(
                "Use font-display: swap in @font-face rules or the &display=swap parameter",
                "@font-face {\n  font-family: 'Custom';\n  src: url('/fonts/custom.woff2') format('woff2');\n  font-display: swap;\n}",
            ),
        );
    }
    issues
}

fn check_render_blocking(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let blocking: Vec<_> = dom::select(&page.document, r#"head link[rel="stylesheet"]"#)
        .into_iter()
        .filter(|link| {
            let disabled = dom::attr(link, "disabled").is_some();
            let media = dom::attr(link, "media");
            !disabled && matches!(media, None | Some("all") | Some("screen"))
        })
        .collect();
    if blocking.len() <= MAX_BLOCKING_CSS {
        return Vec::new();
    }
    vec![Issue::new(
        ids.contextual("perf", "render-blocking"),
        "render-blocking-css",
        Severity::Serious,
        Category::Technical,
        format!("{} render-blocking stylesheets detected", blocking.len()),
    )
    .with_description("Stylesheets in the head block first paint until they load")
    .with_help_url("https://web.dev/defer-non-critical-css/")
    .with_wcag(perf_practice("Defer non-critical CSS"))
    .with_element(r#"head link[rel="stylesheet"]"#, &dom::excerpt(&blocking[0]), format!("{} blocking stylesheets", blocking.len()))
    .with_fix(
        "Inline critical CSS and load the rest asynchronously",
        r#"<link rel="preload" href="styles.css" as="style" onload="this.rel='stylesheet'">"#,
    )]
}

fn check_fonts(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    let font_links = dom::select(&page.document, r#"link[rel="stylesheet"][href*="font"]"#);
    let preloads = dom::select(&page.document, r#"link[rel="preload"][as="font"]"#);
    if let (Some(first), true) = (font_links.first(), preloads.is_empty()) {
        issues.push(
            Issue::new(
                ids.contextual("perf", "font-preload"),
                "font-no-preload",
                Severity::Minor,
                Category::Technical,
                "Web fonts not preloaded",
            )
            .with_description("Preloading critical fonts ensures they're discovered early in the page load, reducing font-loading delays.")
            .with_help_url("https://web.dev/codelab-preload-web-fonts/")
            .with_wcag(perf_practice("Preload critical fonts"))
            .with_element(r#"link[href*="font"]"#, &dom::excerpt(first), "Fonts are not preloaded")
            .with_fix(
                "Add preload links for critical fonts",
                r#"<link rel="preload" href="/fonts/main.woff2" as="font" type="font/woff2" crossorigin>"#,
            ),
        );
    }
    let google = dom::select(&page.document, r#"link[href*="fonts.googleapis.com"]"#);
    let preconnect = dom::select_first(&page.document, r#"link[rel="preconnect"][href*="fonts.googleapis.com"]"#);
    if let (Some(first), None) = (google.first(), preconnect) {
        issues.push(
            Issue::new(
                ids.contextual("perf", "google-fonts"),
                "google-fonts-no-preconnect",
                Severity::Minor,
                Category::Technical,
                "Google Fonts not optimized with preconnect",
            )
            .with_description("Preconnecting to the font origins saves a round trip")
            .with_help_url("https://web.dev/uses-rel-preconnect/")
            .with_wcag(perf_practice("Preconnect to required origins"))
            .with_element(r#"link[href*="fonts.googleapis.com"]"#, &dom::excerpt(first), "No preconnect for fonts.googleapis.com")
            .with_fix(
                "Preconnect to Google Fonts origins",
                "<link rel=\"preconnect\" href=\"https://fonts.googleapis.com\">\n<link rel=\"preconnect\" href=\"https://fonts.gstatic.com\" crossorigin>",
            ),
        );
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(html: &str) -> AuditOutcome {
        let page = Page::from_html("https://example.com/", html);
        let ids = IdGenerator::new();
        PerformanceRules
            .audit(&AuditContext { page: &page, ids: &ids })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_clean_page_passes_every_group() {
        let out = run("<html><head></head><body><p>fast</p></body></html>").await;
        assert!(out.issues.is_empty());
        assert_eq!(out.passed.len(), 6);
    }

    #[tokio::test]
    async fn test_image_checks() {
        let out = run(
            r#"<body>
            <img src="a.webp" width="1" height="1">
            <img src="b.webp" width="1" height="1">
            <img src="c.webp" width="1" height="1">
            <img src="d.PNG">
            </body>"#,
        )
        .await;
        let rules: Vec<&str> = out.issues.iter().map(|i| i.rule_id.as_str()).collect();
        assert_eq!(
            rules,
            vec!["image-missing-dimensions", "image-no-lazy-loading", "image-legacy-format"]
        );
        assert!(out.issues.iter().all(|i| i.category == Category::Images));
        assert!(!out.passed.iter().any(|p| p.id == "perf-images"));
    }

    #[tokio::test]
    async fn test_sync_scripts_block_but_module_and_defer_do_not() {
        let out = run(
            r#"<head><script src="a.js"></script><script src="b.js" defer></script>
               <script type="module" src="c.js"></script></head>"#,
        )
        .await;
        let blocking: Vec<_> = out.issues.iter().filter(|i| i.rule_id == "script-blocking").collect();
        assert_eq!(blocking.len(), 1);
        assert!(blocking[0].element.failure_summary.contains("a.js"));
    }

    #[tokio::test]
    async fn test_google_fonts_without_preconnect() {
        let out = run(
            r#"<head><link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Inter"></head>"#,
        )
        .await;
        let rules: Vec<&str> = out.issues.iter().map(|i| i.rule_id.as_str()).collect();
        assert!(rules.contains(&"google-fonts-no-preconnect"));
        assert!(rules.contains(&"font-no-preload"));
        assert!(rules.contains(&"font-no-display"));
    }
}
