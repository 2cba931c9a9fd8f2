//! General HTML hygiene: document metadata, deprecated markup, broken
//! references, outdated libraries, and hostile UX patterns.

use super::{AuditContext, RuleModule};
use crate::dom;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::{AuditOutcome, Category, Issue, PendingCheck, Severity, Wcag, WcagLevel};
use crate::page::Page;
use async_trait::async_trait;
use regex::Regex;
use scraper::ElementRef;
use std::cmp::Ordering;
use std::collections::HashMap;

const CHARSET_HELP: &str = "https://developer.mozilla.org/en-US/docs/Web/HTML/Element/meta#attr-charset";
const DEPRECATED_HELP: &str =
    "https://developer.mozilla.org/en-US/docs/Web/HTML/Element#deprecated_and_obsolete_elements";
const PERMISSION_HELP: &str = "https://web.dev/permission-ux/";

const DEPRECATED_TAGS: [(&str, &str); 4] = [
    ("marquee", "Marquee"),
    ("blink", "Blink"),
    ("font", "Font"),
    ("center", "Center"),
];

/// Library name, version-capturing pattern, and first safe version. `None`
/// flags every match.
const VULNERABLE_LIBS: [(&str, &str, Option<&str>); 4] = [
    ("jQuery", r"(?i)jquery[-.@]([0-9.]+)", Some("3.5.0")),
    ("Lodash", r"(?i)lodash[-.@]([0-9.]+)", Some("4.17.21")),
    ("Angular 1.x", r"(?i)angular[-.@]1\.([0-9.]+)", None),
    ("Bootstrap", r"(?i)bootstrap[-.@]([0-9.]+)", Some("3.4.0")),
];

/// Best-practices rule module.
pub struct BestPracticeRules;

#[async_trait(?Send)]
impl RuleModule for BestPracticeRules {
    fn name(&self) -> &str {
        "Best Practices"
    }

    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
        let page = ctx.page;
        let ids = ctx.ids;
        let mut out = AuditOutcome::new();

        let groups: [(Vec<Issue>, PendingCheck); 11] = [
            (
                check_doctype(page, ids).into_iter().collect(),
                PendingCheck::new("bp-doctype", "DOCTYPE Declaration", Category::Document, "Page has a valid HTML5 DOCTYPE"),
            ),
            (
                check_charset(page, ids).into_iter().collect(),
                PendingCheck::new("bp-charset", "Character Encoding", Category::Document, "Page specifies UTF-8 character encoding"),
            ),
            (
                check_html_lang(page, ids).into_iter().collect(),
                PendingCheck::new("bp-html-lang", "HTML Language", Category::Document, "HTML element has a lang attribute"),
            ),
            (
                check_deprecated_elements(page, ids),
                PendingCheck::new("bp-deprecated", "No Deprecated Elements", Category::Structure, "Page does not use deprecated HTML elements"),
            ),
            (
                check_duplicate_ids(page, ids),
                PendingCheck::new("bp-duplicate-ids", "Unique IDs", Category::Technical, "All element IDs are unique"),
            ),
            (
                check_image_sources(page, ids),
                PendingCheck::new("bp-images", "Image Sources", Category::Images, "All images have src attributes"),
            ),
            (
                check_links(page, ids),
                PendingCheck::new("bp-links", "Link Validity", Category::Interactive, "All links have an href and accessible text"),
            ),
            (
                check_meta_refresh(page, ids).into_iter().collect(),
                PendingCheck::new("bp-meta-refresh", "No Meta Refresh", Category::Document, "Page does not use meta refresh redirects"),
            ),
            (
                check_vulnerable_libraries(page, ids)?,
                PendingCheck::new("bp-vulnerable-libs", "Library Security", Category::Technical, "No known vulnerable libraries detected"),
            ),
            (
                check_password_paste(page, ids),
                PendingCheck::new("bp-password-paste", "Password Paste Allowed", Category::Forms, "Password fields allow pasting"),
            ),
            (
                check_intrusive_permissions(page, ids),
                PendingCheck::new("bp-permissions", "Non-Intrusive Permissions", Category::Technical, "No permission requests on page load"),
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

fn html_practice(level: WcagLevel, description: &str) -> Wcag {
    Wcag::new("N/A", level, "HTML Best Practice", description)
}

fn check_doctype(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let valid = dom::doctype_name(&page.document)
        .map(|name| name.eq_ignore_ascii_case("html"))
        .unwrap_or(false);
    if valid {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("bp", "no-doctype"),
            "doctype-missing",
            Severity::Serious,
            Category::Document,
            "Page missing HTML5 DOCTYPE declaration",
        )
        .with_description("Without a valid DOCTYPE browsers may fall back to quirks mode and render inconsistently.")
        .with_help_url("https://developer.mozilla.org/en-US/docs/Glossary/Doctype")
        .with_wcag(html_practice(WcagLevel::A, "Pages should have a valid DOCTYPE"))
        .with_element("html", "<!DOCTYPE html>", "Missing or invalid DOCTYPE declaration")
        .with_fix(
            "Add HTML5 DOCTYPE at the beginning of the document",
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  ...",
        ),
    )
}

fn check_charset(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let meta_charset = dom::select_first(&page.document, "meta[charset]");
    let http_equiv = dom::select(&page.document, "meta[http-equiv]")
        .into_iter()
        .find(|m| dom::attr(m, "http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("content-type")));

    let Some(meta) = meta_charset else {
        if http_equiv.is_some() {
            return None;
        }
        return Some(
            Issue::new(
                ids.contextual("bp", "no-charset"),
                "charset-missing",
                Severity::Serious,
                Category::Document,
                "Page missing character encoding declaration",
            )
            .with_description("Declaring the encoding prevents mis-rendered text and encoding-based injection.")
            .with_help_url(CHARSET_HELP)
            .with_wcag(html_practice(WcagLevel::A, "Declare character encoding"))
            .with_element("head", r#"<meta charset="UTF-8">"#, "No character encoding specified")
            .with_fix("Add charset meta tag in the head section", "<head>\n  <meta charset=\"UTF-8\">\n  ..."),
        );
    };
    let charset = dom::attr(&meta, "charset").unwrap_or("").trim();
    if charset.is_empty() || charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("bp", "non-utf8-charset"),
            "charset-not-utf8",
            Severity::Moderate,
            Category::Document,
            format!("Character encoding is {}, not UTF-8", charset),
        )
        .with_description("UTF-8 supports every character and language and is the recommended encoding for HTML.")
        .with_help_url(CHARSET_HELP)
        .with_wcag(html_practice(WcagLevel::AA, "Use UTF-8 encoding"))
        .with_element("meta[charset]", &dom::excerpt(&meta), format!("Charset is {} instead of UTF-8", charset))
        .with_fix("Change charset to UTF-8", r#"<meta charset="UTF-8">"#),
    )
}

fn check_html_lang(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let has_lang = dom::select_first(&page.document, "html")
        .and_then(|html| dom::non_empty_attr(&html, "lang"))
        .is_some();
    if has_lang {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("bp", "no-html-lang"),
            "html-lang-missing",
            Severity::Serious,
            Category::Document,
            "HTML element missing lang attribute",
        )
        .with_description("The lang attribute lets screen readers pick the right pronunciation and search engines serve language-specific results.")
        .with_help_url("https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes/lang")
        .with_wcag(Wcag::new(
            "WCAG 3.1.1",
            WcagLevel::A,
            "Language of Page",
            "The default language can be programmatically determined",
        ))
        .with_element("html", r#"<html lang="en">"#, "HTML element does not have a lang attribute")
        .with_fix("Add lang attribute to the HTML element", r#"<html lang="en">"#),
    )
}

fn check_deprecated_elements(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (tag, name) in DEPRECATED_TAGS {
        let code = match tag {
            "marquee" => "/* Use CSS animation */\n@keyframes scroll {\n  from { transform: translateX(100%); }\n  to { transform: translateX(-100%); }\n}",
            "center" => "/* Use CSS */\n.centered {\n  text-align: center;\n}",
            _ => "/* Use CSS for styling */",
        };
        for el in dom::select(&page.document, tag) {
            issues.push(
                Issue::new(
                    ids.contextual("bp", &format!("deprecated-{}", tag)),
                    &format!("deprecated-{}", tag),
                    Severity::Moderate,
                    Category::Structure,
                    format!("Deprecated <{}> element used", tag),
                )
                .with_description(format!(
                    "The <{}> element is deprecated. Use CSS for styling and animation instead.",
                    tag
                ))
                .with_help_url(DEPRECATED_HELP)
                .with_wcag(html_practice(WcagLevel::A, "Avoid deprecated elements"))
                .with_element(&dom::build_selector(&el), &dom::excerpt(&el), format!("{} element is deprecated", name))
                .with_fix(format!("Replace <{}> with modern CSS", tag), code),
            );
        }
    }
    issues
}

fn check_duplicate_ids(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut order: Vec<&str> = Vec::new();
    let mut seen: HashMap<&str, Vec<ElementRef<'_>>> = HashMap::new();
    for el in dom::select(&page.document, "[id]") {
        let Some(id) = dom::non_empty_attr(&el, "id") else {
            continue;
        };
        let entry = seen.entry(id).or_default();
        if entry.is_empty() {
            order.push(id);
        }
        entry.push(el);
    }

    let mut issues = Vec::new();
    for id in order {
        let elements = &seen[id];
        if elements.len() < 2 {
            continue;
        }
        issues.push(
            Issue::new(
                ids.contextual("bp", "duplicate-id"),
                "duplicate-id",
                Severity::Serious,
                Category::Technical,
                format!("Duplicate ID \"{}\" found {} times", id, elements.len()),
            )
            .with_description("Element IDs must be unique. Duplicates break label associations, scripts, and styling.")
            .with_help_url("https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes/id")
            .with_wcag(Wcag::new("WCAG 4.1.1", WcagLevel::A, "Parsing", "Elements have unique IDs"))
            .with_element(
                &format!("#{}", id),
                &dom::excerpt(&elements[0]),
                format!("ID \"{}\" is used {} times", id, elements.len()),
            )
            .with_fix(
                "Make each ID unique or use classes instead",
                format!(
                    "<div id=\"{id}-1\">...</div>\n<div id=\"{id}-2\">...</div>\n\n<!-- Or use classes -->\n<div class=\"{id}\">...</div>",
                    id = id
                ),
            ),
        );
    }
    issues
}

fn check_image_sources(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    dom::select(&page.document, "img")
        .into_iter()
        .filter(|img| dom::non_empty_attr(img, "src").is_none())
        .map(|img| {
            Issue::new(
                ids.contextual("bp", "img-no-src"),
                "image-no-src",
                Severity::Serious,
                Category::Images,
                "Image has empty or missing src attribute",
            )
            .with_description("An empty src triggers a useless request and leaves assistive technology with nothing to describe.")
            .with_help_url("https://developer.mozilla.org/en-US/docs/Web/HTML/Element/img#attr-src")
            .with_wcag(html_practice(WcagLevel::A, "Images must have valid src"))
            .with_element(&dom::build_selector(&img), &dom::excerpt(&img), "Image src attribute is empty or missing")
            .with_fix("Add a valid src attribute to the image", r#"<img src="/images/photo.jpg" alt="Description">"#)
        })
        .collect()
}

fn check_links(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    for link in dom::select(&page.document, "a") {
        let selector = dom::build_selector(&link);
        let html = dom::excerpt(&link);
        if dom::non_empty_attr(&link, "href").is_none() {
            issues.push(
                Issue::new(
                    ids.contextual("bp", "link-no-href"),
                    "link-no-href",
                    Severity::Moderate,
                    Category::Interactive,
                    "Link has empty or missing href attribute",
                )
                .with_description("Links without a destination confuse users and assistive technology.")
                .with_help_url("https://developer.mozilla.org/en-US/docs/Web/HTML/Element/a#attr-href")
                .with_wcag(html_practice(WcagLevel::A, "Links must have valid href"))
                .with_element(&selector, &html, "Link href attribute is empty or missing")
                .with_fix(
                    "Add a valid href or use a button instead",
                    "<a href=\"/page\">Link text</a>\n\n<!-- Or use a button for actions -->\n<button type=\"button\">Click me</button>",
                ),
            );
        }
        let named = !dom::text(&link).is_empty()
            || dom::non_empty_attr(&link, "aria-label").is_some()
            || dom::non_empty_attr(&link, "title").is_some()
            || !dom::select_in(link, "img[alt]").is_empty();
        if !named {
            issues.push(
                Issue::new(
                    ids.contextual("bp", "link-no-text"),
                    "link-no-text",
                    Severity::Serious,
                    Category::Interactive,
                    "Link has no accessible name",
                )
                .with_description("Links need text, an aria-label, or an image with alt text so screen readers can announce them.")
                .with_help_url("https://www.w3.org/WAI/WCAG21/Understanding/link-purpose-in-context")
                .with_wcag(Wcag::new("WCAG 2.4.4", WcagLevel::A, "Link Purpose", "Links have accessible names"))
                .with_element(&selector, &html, "Link has no accessible name")
                .with_fix(
                    "Add text content or aria-label",
                    "<a href=\"/page\">Go to page</a>\n\n<!-- Or aria-label -->\n<a href=\"/page\" aria-label=\"Go to page\">\n  <svg>...</svg>\n</a>",
                ),
            );
        }
    }
    issues
}

fn check_meta_refresh(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let meta = dom::select(&page.document, "meta[http-equiv]")
        .into_iter()
        .find(|m| dom::attr(m, "http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("refresh")))?;
    Some(
        Issue::new(
            ids.contextual("bp", "meta-refresh"),
            "meta-refresh",
            Severity::Serious,
            Category::Document,
            "Page uses meta refresh for redirection",
        )
        .with_description("Meta refresh redirects hurt accessibility and SEO. Use an HTTP redirect instead.")
        .with_help_url("https://developer.mozilla.org/en-US/docs/Web/HTML/Element/meta#http-equiv")
        .with_wcag(Wcag::new("WCAG 2.2.1", WcagLevel::A, "Timing Adjustable", "Avoid automatic redirects"))
        .with_element(r#"meta[http-equiv="refresh"]"#, &dom::excerpt(&meta), "Meta refresh redirect detected")
        .with_fix(
            "Use server-side redirect or JavaScript",
            "# Server-side\nRedirect 301 /old-page /new-page\n\n// Or JavaScript\nwindow.location.href = '/new-page';",
        )
        .with_learn_more("https://developer.mozilla.org/en-US/docs/Web/HTTP/Redirections"),
    )
}

/// Dotted numeric comparison; missing or non-numeric parts count as zero.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> { v.split('.').map(|p| p.parse().unwrap_or(0)).collect() };
    let (a, b) = (parse(a), parse(b));
    for i in 0..a.len().max(b.len()) {
        let ord = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn check_vulnerable_libraries(page: &Page, ids: &IdGenerator) -> Result<Vec<Issue>> {
    let patterns = VULNERABLE_LIBS
        .iter()
        .map(|(name, pattern, safe)| -> Result<(&str, Regex, Option<&str>)> {
            Ok((*name, Regex::new(pattern)?, *safe))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut issues = Vec::new();
    for script in dom::select(&page.document, "script[src]") {
        let src = dom::attr(&script, "src").unwrap_or("");
        for (name, pattern, safe) in &patterns {
            let Some(caps) = pattern.captures(src) else {
                continue;
            };
            let version = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let vulnerable = match safe {
                None => true,
                Some(safe) => !version.is_empty() && compare_versions(version, safe) == Ordering::Less,
            };
            if !vulnerable {
                continue;
            }
            issues.push(
                Issue::new(
                    ids.contextual("bp", "vulnerable-lib"),
                    "vulnerable-library",
                    Severity::Critical,
                    Category::Technical,
                    format!("Vulnerable {} version detected", name),
                )
                .with_description(format!(
                    "The page uses {} {}, which has known security vulnerabilities. Update to the latest version.",
                    name,
                    if version.is_empty() { "unknown version" } else { version }
                ))
                .with_help_url("https://snyk.io/vuln/")
                .with_wcag(Wcag::new("N/A", WcagLevel::AAA, "Security Best Practice", "Avoid vulnerable libraries"))
                .with_element(
                    &dom::build_selector(&script),
                    &dom::excerpt(&script),
                    format!("{} {} has known vulnerabilities", name, version),
                )
                .with_fix(
                    format!("Update {} to the latest secure version", name),
                    format!("// Check https://snyk.io/vuln/ for details\n// npm update {}", name.to_lowercase()),
                ),
            );
        }
    }
    Ok(issues)
}

fn check_password_paste(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    dom::select(&page.document, r#"input[type="password"]"#)
        .into_iter()
        .filter(|field| dom::attr(field, "onpaste").is_some_and(|h| h.contains("return false")))
        .map(|field| {
            Issue::new(
                ids.contextual("bp", "password-no-paste"),
                "password-paste-blocked",
                Severity::Serious,
                Category::Forms,
                "Password field blocks pasting",
            )
            .with_description("Blocking paste discourages password managers and weakens security.")
            .with_help_url("https://www.ncsc.gov.uk/blog-post/let-them-paste-passwords")
            .with_wcag(Wcag::new("N/A", WcagLevel::AAA, "Security Best Practice", "Allow password pasting"))
            .with_element(&dom::build_selector(&field), &dom::excerpt(&field), "Password field prevents pasting")
            .with_fix("Remove onpaste restriction", r#"<input type="password" name="password">"#)
        })
        .collect()
}

fn check_intrusive_permissions(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let ux = || Wcag::new("N/A", WcagLevel::AAA, "UX Best Practice", "Request permissions contextually");
    let mut issues = Vec::new();
    for script in dom::select(&page.document, "script:not([src])") {
        let body: String = script.text().collect();
        let selector = dom::build_selector(&script);
        let html = dom::excerpt(&script);
        if body.contains("navigator.geolocation") {
            issues.push(
                Issue::new(
                    ids.contextual("bp", "geolocation"),
                    "intrusive-geolocation",
                    Severity::Moderate,
                    Category::Technical,
                    "Page may request geolocation on load",
                )
                .with_description("Ask for location only in response to a user action.")
                .with_help_url(PERMISSION_HELP)
                .with_wcag(ux())
                .with_element(&selector, &html, "Geolocation API called in script")
                .with_fix(
                    "Request geolocation only when user initiates action",
                    "button.addEventListener('click', () => {\n  navigator.geolocation.getCurrentPosition(...);\n});",
                ),
            );
        }
        if body.contains("Notification.requestPermission") {
            issues.push(
                Issue::new(
                    ids.contextual("bp", "notification"),
                    "intrusive-notification",
                    Severity::Moderate,
                    Category::Technical,
                    "Page may request notification permission on load",
                )
                .with_description("Unprompted notification requests are usually denied. Ask after user engagement.")
                .with_help_url(PERMISSION_HELP)
                .with_wcag(ux())
                .with_element(&selector, &html, "Notification permission requested in script")
                .with_fix(
                    "Request notification permission in response to user action",
                    "button.addEventListener('click', async () => {\n  const permission = await Notification.requestPermission();\n});",
                ),
            );
        }
    }
    issues
}
