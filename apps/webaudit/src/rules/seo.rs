//! SEO rules: title, description, headings, viewport, canonical, social
//! previews, and structured data.

use super::{AuditContext, RuleModule};
use crate::dom;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::{AuditOutcome, Category, Issue, PendingCheck, Severity, Wcag, WcagLevel};
use crate::page::Page;
use async_trait::async_trait;

const TITLE_HELP: &str = "https://developers.google.com/search/docs/appearance/title-link";
const SNIPPET_HELP: &str = "https://developers.google.com/search/docs/appearance/snippet";
const TITLE_RANGE: (usize, usize) = (30, 60);
const DESCRIPTION_RANGE: (usize, usize) = (120, 160);

/// SEO rule module.
pub struct SeoRules;

#[async_trait(?Send)]
impl RuleModule for SeoRules {
    fn name(&self) -> &str {
        "SEO"
    }

    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
        let page = ctx.page;
        let ids = ctx.ids;
        let mut out = AuditOutcome::new();

        match check_title(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "seo-title",
                "Page Title",
                Category::Document,
                "Title is present and properly sized",
            )),
        }
        match check_meta_description(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "seo-meta-desc",
                "Meta Description",
                Category::Document,
                "Meta description is present and properly sized",
            )),
        }
        let h1 = check_h1(page, ids);
        if h1.is_empty() {
            out.pass(PendingCheck::new(
                "seo-h1",
                "H1 Heading",
                Category::Structure,
                "Page has exactly one H1 heading",
            ));
        }
        out.issues.extend(h1);
        match check_viewport(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "seo-viewport",
                "Viewport Meta Tag",
                Category::Document,
                "Viewport meta tag is present",
            )),
        }
        match check_https(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "seo-https",
                "HTTPS Protocol",
                Category::Technical,
                "Page is served over HTTPS",
            )),
        }
        match check_canonical(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "seo-canonical",
                "Canonical URL",
                Category::Document,
                "Canonical URL is present",
            )),
        }
        let og = check_open_graph(page, ids);
        if og.is_empty() {
            out.pass(PendingCheck::new(
                "seo-og",
                "Open Graph Tags",
                Category::Document,
                "Open Graph tags are present",
            ));
        }
        out.issues.extend(og);
        match check_structured_data(page, ids) {
            Some(issue) => out.issue(issue),
            None => out.pass(PendingCheck::new(
                "seo-schema",
                "Structured Data",
                Category::Document,
                "Structured data is present",
            )),
        }
        Ok(out)
    }
}

fn page_titled() -> Wcag {
    Wcag::new("2.4.2", WcagLevel::A, "Page Titled", "Web pages have titles")
}

fn check_title(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let title_el = dom::select_first(&page.document, "title");
    let title = title_el.as_ref().map(dom::text).unwrap_or_default();
    let Some(title_el) = title_el.filter(|_| !title.is_empty()) else {
        return Some(
            Issue::new(
                ids.contextual("seo", "title-missing"),
                "seo-title-missing",
                Severity::Critical,
                Category::Document,
                "Page is missing a title tag",
            )
            .with_description("Every page should have a unique, descriptive title tag for SEO and accessibility")
            .with_help_url(TITLE_HELP)
            .with_wcag(page_titled())
            .with_element("head", "<head>...</head>", "No title tag found")
            .with_fix(
                "Add a descriptive title tag within the <head> section",
                "<title>Your Page Title Here (50-60 characters)</title>",
            ),
        );
    };
    let len = title.chars().count();
    if len < TITLE_RANGE.0 || len > TITLE_RANGE.1 {
        let shortened: String = title.chars().take(TITLE_RANGE.1).collect();
        return Some(
            Issue::new(
                ids.contextual("seo", "title-length"),
                "seo-title-length",
                Severity::Moderate,
                Category::Document,
                format!("Title length is {} characters (recommended: 50-60)", len),
            )
            .with_description("Page titles should be between 50-60 characters for optimal display")
            .with_help_url(TITLE_HELP)
            .with_wcag(Wcag::new("2.4.2", WcagLevel::A, "Page Titled", "Titles describe topic or purpose"))
            .with_element("title", &dom::excerpt(&title_el), format!("Title is {} chars", len))
            .with_fix(
                "Adjust your title to be between 50-60 characters for better SEO",
                format!("<title>{}...</title>", shortened),
            ),
        );
    }
    None
}

fn check_meta_description(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    let meta = dom::select_first(&page.document, r#"meta[name="description"]"#);
    let content = meta
        .as_ref()
        .and_then(|m| dom::non_empty_attr(m, "content"))
        .unwrap_or("");
    let Some(meta) = meta.filter(|_| !content.is_empty()) else {
        return Some(
            Issue::new(
                ids.contextual("seo", "meta-desc-missing"),
                "seo-meta-desc-missing",
                Severity::Serious,
                Category::Document,
                "Page is missing a meta description",
            )
            .with_description("Meta descriptions summarize the page in search results")
            .with_help_url(SNIPPET_HELP)
            .with_wcag(page_titled())
            .with_element("head", "<head>...</head>", "No meta description found")
            .with_fix(
                "Add a meta description within the <head> section",
                r#"<meta name="description" content="A concise summary of the page (120-160 characters)">"#,
            ),
        );
    };
    let len = content.chars().count();
    if len < DESCRIPTION_RANGE.0 || len > DESCRIPTION_RANGE.1 {
        return Some(
            Issue::new(
                ids.contextual("seo", "meta-desc-length"),
                "seo-meta-desc-length",
                Severity::Moderate,
                Category::Document,
                format!("Meta description is {} characters (recommended: 120-160)", len),
            )
            .with_description("Descriptions outside 120-160 characters are truncated or underused in results")
            .with_help_url(SNIPPET_HELP)
            .with_wcag(page_titled())
            .with_element(r#"meta[name="description"]"#, &dom::excerpt(&meta), format!("Description is {} chars", len))
            .with_fix("Rewrite the description to 120-160 characters", ""),
        );
    }
    None
}

fn check_h1(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let headings = dom::select(&page.document, "h1");
    let wcag = Wcag::new("1.3.1", WcagLevel::A, "Info and Relationships", "Headings convey structure");
    match headings.len() {
        0 => vec![Issue::new(
            ids.contextual("seo", "h1-missing"),
            "seo-h1-missing",
            Severity::Serious,
            Category::Structure,
            "Page is missing an H1 heading",
        )
        .with_description("An H1 tells search engines and readers what the page is about")
        .with_help_url("https://developers.google.com/search/docs/appearance/title-link")
        .with_wcag(wcag)
        .with_element("body", "<body>...</body>", "No h1 element found")
        .with_fix("Add a single descriptive H1 heading", "<h1>Main topic of the page</h1>")],
        1 => Vec::new(),
        n => vec![Issue::new(
            ids.contextual("seo", "h1-multiple"),
            "seo-h1-multiple",
            Severity::Moderate,
            Category::Structure,
            format!("Page has {} H1 headings", n),
        )
        .with_description("Multiple H1 headings dilute the primary topic of the page")
        .with_help_url("https://developers.google.com/search/docs/appearance/title-link")
        .with_wcag(wcag)
        .with_element("h1", &dom::excerpt(&headings[1]), format!("{} h1 elements found", n))
        .with_fix("Keep one H1 and demote the others to H2", "<h1>Main topic</h1>\n<h2>Section</h2>")],
    }
}

fn check_viewport(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if dom::select_first(&page.document, r#"meta[name="viewport"]"#).is_some() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("seo", "viewport-missing"),
            "seo-viewport-missing",
            Severity::Serious,
            Category::Document,
            "Page is missing a viewport meta tag",
        )
        .with_description("Mobile-friendly pages rank better and need a viewport declaration")
        .with_help_url("https://developers.google.com/search/docs/crawling-indexing/mobile/mobile-sites-mobile-first-indexing")
        .with_wcag(Wcag::new("1.4.4", WcagLevel::AA, "Resize Text", "Text can be resized"))
        .with_element("head", "<head>...</head>", "No viewport meta tag found")
        .with_fix(
            "Add a responsive viewport meta tag",
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
        ),
    )
}

fn check_https(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if page.is_https() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("seo", "https"),
            "seo-https",
            Severity::Critical,
            Category::Technical,
            "Page is not served over HTTPS",
        )
        .with_description("HTTPS is a ranking signal and protects visitors")
        .with_help_url("https://developers.google.com/search/docs/crawling-indexing/https")
        .with_wcag(Wcag::new("4.1.1", WcagLevel::A, "Parsing", "Content is delivered securely"))
        .with_element("html", "", format!("URL: {}", page.url))
        .with_fix("Serve the page over HTTPS and redirect HTTP traffic", ""),
    )
}

fn check_canonical(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if dom::select_first(&page.document, r#"link[rel="canonical"]"#).is_some() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("seo", "canonical-missing"),
            "seo-canonical-missing",
            Severity::Moderate,
            Category::Document,
            "Page is missing a canonical URL",
        )
        .with_description("Canonical links prevent duplicate content from splitting ranking signals")
        .with_help_url("https://developers.google.com/search/docs/crawling-indexing/consolidate-duplicate-urls")
        .with_wcag(Wcag::new("4.1.1", WcagLevel::A, "Parsing", "Metadata is well-formed"))
        .with_element("head", "<head>...</head>", "No canonical link found")
        .with_fix(
            "Add a canonical link to the preferred URL",
            format!(r#"<link rel="canonical" href="{}">"#, page.url),
        ),
    )
}

fn check_open_graph(page: &Page, ids: &IdGenerator) -> Vec<Issue> {
    let mut issues = Vec::new();
    let og_help = "https://ogp.me/";
    if dom::select_first(&page.document, r#"meta[property="og:title"]"#).is_none() {
        issues.push(
            Issue::new(
                ids.contextual("seo", "og-title"),
                "seo-og-title",
                Severity::Moderate,
                Category::Document,
                "Missing og:title meta tag",
            )
            .with_description("Open Graph tags improve how page appears when shared")
            .with_help_url(og_help)
            .with_wcag(Wcag::new("2.4.2", WcagLevel::A, "Page Titled", "Pages are titled"))
            .with_element("head", "<head>...</head>", "No og:title found")
            .with_fix(
                "Add Open Graph meta tags for better social sharing",
                r#"<meta property="og:title" content="Page title">"#,
            ),
        );
    }
    if dom::select_first(&page.document, r#"meta[property="og:image"]"#).is_none() {
        issues.push(
            Issue::new(
                ids.contextual("seo", "og-image"),
                "seo-og-image",
                Severity::Moderate,
                Category::Document,
                "Missing og:image meta tag",
            )
            .with_description("og:image ensures preview image displays when shared")
            .with_help_url(og_help)
            .with_wcag(Wcag::new("1.1.1", WcagLevel::A, "Non-text Content", "Images have alternatives"))
            .with_element("head", "<head>...</head>", "No og:image found")
            .with_fix(
                "Add an Open Graph image tag",
                r#"<meta property="og:image" content="https://example.com/preview.png">"#,
            ),
        );
    }
    issues
}

fn check_structured_data(page: &Page, ids: &IdGenerator) -> Option<Issue> {
    if dom::select_first(&page.document, r#"script[type="application/ld+json"]"#).is_some() {
        return None;
    }
    Some(
        Issue::new(
            ids.contextual("seo", "schema-missing"),
            "seo-schema-missing",
            Severity::Moderate,
            Category::Document,
            "No structured data found",
        )
        .with_description("Structured data helps search engines understand content")
        .with_help_url("https://developers.google.com/search/docs/appearance/structured-data/intro-structured-data")
        .with_wcag(Wcag::new("4.1.2", WcagLevel::A, "Name, Role, Value", "Metadata is available"))
        .with_element("head", "<head>...</head>", "No JSON-LD script found")
        .with_fix(
            "Add Schema.org structured data using JSON-LD format",
            "<script type=\"application/ld+json\">\n{\"@context\": \"https://schema.org\", \"@type\": \"WebPage\", \"name\": \"Page\"}\n</script>",
        ),
    )
}
