//! Accessibility rules evaluated against the parsed document.
//!
//! Each rule is a row in [`RULES`]: its metadata (impact, category, WCAG
//! criterion, remediation text) plus a check function that returns the
//! offending nodes. Nothing is injected into or written to the page, so the
//! module can share the document with the others without coordination.
//!
//! A rule with no findings is reported as a passed check `pass-<rule>`.

use super::{AuditContext, RuleModule};
use crate::dom;
use crate::error::Result;
use crate::models::{AuditOutcome, Category, Issue, PendingCheck, Severity, Wcag, WcagLevel};
use crate::page::Page;
use async_trait::async_trait;
use scraper::ElementRef;
use std::collections::{HashMap, HashSet};

const HELP_BASE: &str = "https://dequeuniversity.com/rules/axe/4.8/";

/// Roles accepted by `aria-roles`.
const ARIA_ROLES: &[&str] = &[
    "alert", "alertdialog", "application", "article", "banner", "blockquote", "button", "caption",
    "cell", "checkbox", "code", "columnheader", "combobox", "complementary", "contentinfo",
    "definition", "deletion", "dialog", "directory", "document", "emphasis", "feed", "figure",
    "form", "generic", "grid", "gridcell", "group", "heading", "img", "insertion", "link", "list",
    "listbox", "listitem", "log", "main", "marquee", "math", "menu", "menubar", "menuitem",
    "menuitemcheckbox", "menuitemradio", "meter", "navigation", "none", "note", "option",
    "paragraph", "presentation", "progressbar", "radio", "radiogroup", "region", "row",
    "rowgroup", "rowheader", "scrollbar", "search", "searchbox", "separator", "slider",
    "spinbutton", "status", "strong", "subscript", "superscript", "switch", "tab", "table",
    "tablist", "tabpanel", "term", "textbox", "time", "timer", "toolbar", "tooltip", "tree",
    "treegrid", "treeitem",
];

/// One offending node.
struct Finding {
    selector: String,
    html: String,
    summary: String,
}

impl Finding {
    fn at(el: &ElementRef<'_>, summary: impl Into<String>) -> Self {
        Self {
            selector: dom::build_selector(el),
            html: dom::excerpt(el),
            summary: summary.into(),
        }
    }

    fn synthetic(selector: &str, summary: impl Into<String>) -> Self {
        Self {
            selector: selector.to_string(),
            html: String::new(),
            summary: summary.into(),
        }
    }
}

struct A11yRule {
    id: &'static str,
    help: &'static str,
    description: &'static str,
    severity: Severity,
    category: Category,
    wcag: (&'static str, WcagLevel, &'static str, &'static str),
    guidance: &'static str,
    check: fn(&Page) -> Vec<Finding>,
}

const RULES: [A11yRule; 19] = [
    A11yRule {
        id: "image-alt",
        help: "Images must have alternate text",
        description: "Ensures <img> elements have alternate text or a role of none or presentation",
        severity: Severity::Critical,
        category: Category::Images,
        wcag: ("WCAG 1.1.1", WcagLevel::A, "Non-text Content", "All non-text content has a text alternative"),
        guidance: "Add descriptive alt text that conveys the image content",
        check: check_image_alt,
    },
    A11yRule {
        id: "input-image-alt",
        help: "Image buttons must have alternate text",
        description: "Ensures <input type=\"image\"> elements have alternate text",
        severity: Severity::Critical,
        category: Category::Forms,
        wcag: ("WCAG 1.1.1", WcagLevel::A, "Non-text Content", "All non-text content has a text alternative"),
        guidance: "Add alt text to image input buttons",
        check: check_input_image_alt,
    },
    A11yRule {
        id: "button-name",
        help: "Buttons must have discernible text",
        description: "Ensures buttons have discernible text",
        severity: Severity::Critical,
        category: Category::Interactive,
        wcag: ("WCAG 4.1.2", WcagLevel::A, "Name, Role, Value", "User interface components have a name and role"),
        guidance: "Add text content or aria-label to the button",
        check: check_button_name,
    },
    A11yRule {
        id: "link-name",
        help: "Links must have discernible text",
        description: "Ensures links have discernible text",
        severity: Severity::Serious,
        category: Category::Interactive,
        wcag: ("WCAG 2.4.4", WcagLevel::A, "Link Purpose (In Context)", "The purpose of each link can be determined"),
        guidance: "Add descriptive text content to the link",
        check: check_link_name,
    },
    A11yRule {
        id: "label",
        help: "Form elements must have labels",
        description: "Ensures every form element has a label",
        severity: Severity::Critical,
        category: Category::Forms,
        wcag: ("WCAG 3.3.2", WcagLevel::A, "Labels or Instructions", "Labels or instructions are provided for user input"),
        guidance: "Associate a label with the input using for/id or wrapping",
        check: check_label,
    },
    A11yRule {
        id: "select-name",
        help: "Select element must have an accessible name",
        description: "Ensures select elements have an accessible name",
        severity: Severity::Critical,
        category: Category::Forms,
        wcag: ("WCAG 4.1.2", WcagLevel::A, "Name, Role, Value", "User interface components have a name and role"),
        guidance: "Add an accessible name to the select element",
        check: check_select_name,
    },
    A11yRule {
        id: "html-has-lang",
        help: "<html> element must have a lang attribute",
        description: "Ensures every HTML document has a lang attribute",
        severity: Severity::Serious,
        category: Category::Document,
        wcag: ("WCAG 3.1.1", WcagLevel::A, "Language of Page", "The default language can be programmatically determined"),
        guidance: "Add a lang attribute to the html element",
        check: check_html_has_lang,
    },
    A11yRule {
        id: "valid-lang",
        help: "lang attribute must have a valid value",
        description: "Ensures lang attributes have valid values",
        severity: Severity::Serious,
        category: Category::Document,
        wcag: ("WCAG 3.1.2", WcagLevel::AA, "Language of Parts", "The language of each passage can be programmatically determined"),
        guidance: "Use a valid BCP 47 language code",
        check: check_valid_lang,
    },
    A11yRule {
        id: "document-title",
        help: "Documents must have <title> element to aid in navigation",
        description: "Ensures each HTML document contains a non-empty <title> element",
        severity: Severity::Serious,
        category: Category::Document,
        wcag: ("WCAG 2.4.2", WcagLevel::A, "Page Titled", "Web pages have titles that describe topic or purpose"),
        guidance: "Add a descriptive title to the page",
        check: check_document_title,
    },
    A11yRule {
        id: "heading-order",
        help: "Heading levels should only increase by one",
        description: "Ensures the order of headings is semantically correct",
        severity: Severity::Moderate,
        category: Category::Structure,
        wcag: ("WCAG 1.3.1", WcagLevel::A, "Info and Relationships", "Structure can be programmatically determined"),
        guidance: "Ensure headings follow a logical order without skipping levels",
        check: check_heading_order,
    },
    A11yRule {
        id: "aria-roles",
        help: "ARIA roles used must conform to valid values",
        description: "Ensures all elements with a role attribute use a valid value",
        severity: Severity::Critical,
        category: Category::Aria,
        wcag: ("WCAG 4.1.2", WcagLevel::A, "Name, Role, Value", "User interface components have a name and role"),
        guidance: "Use a valid ARIA role value",
        check: check_aria_roles,
    },
    A11yRule {
        id: "tabindex",
        help: "Elements should not have tabindex greater than zero",
        description: "Ensures tabindex attribute values are not greater than 0",
        severity: Severity::Serious,
        category: Category::Technical,
        wcag: ("WCAG 2.4.3", WcagLevel::A, "Focus Order", "Focusable components receive focus in a meaningful order"),
        guidance: "Use tabindex=\"0\" or \"-1\" instead of positive values",
        check: check_tabindex,
    },
    A11yRule {
        id: "duplicate-id",
        help: "id attribute value must be unique",
        description: "Ensures every id attribute value is unique",
        severity: Severity::Minor,
        category: Category::Technical,
        wcag: ("WCAG 4.1.1", WcagLevel::A, "Parsing", "Elements have unique IDs"),
        guidance: "Ensure all id attributes are unique on the page",
        check: check_duplicate_id,
    },
    A11yRule {
        id: "frame-title",
        help: "Frames must have an accessible name",
        description: "Ensures <iframe> and <frame> elements have an accessible name",
        severity: Severity::Serious,
        category: Category::Document,
        wcag: ("WCAG 4.1.2", WcagLevel::A, "Name, Role, Value", "User interface components have a name and role"),
        guidance: "Add a title attribute to the iframe",
        check: check_frame_title,
    },
    A11yRule {
        id: "video-caption",
        help: "<video> elements must have captions",
        description: "Ensures <video> elements have captions",
        severity: Severity::Critical,
        category: Category::Images,
        wcag: ("WCAG 1.2.2", WcagLevel::A, "Captions (Prerecorded)", "Captions are provided for prerecorded audio in video"),
        guidance: "Add captions to video content",
        check: check_video_caption,
    },
    A11yRule {
        id: "marquee",
        help: "<marquee> elements are deprecated and must not be used",
        description: "Ensures <marquee> elements are not used",
        severity: Severity::Serious,
        category: Category::Technical,
        wcag: ("WCAG 2.2.2", WcagLevel::A, "Pause, Stop, Hide", "Moving content can be paused, stopped, or hidden"),
        guidance: "Replace <marquee> with CSS animations",
        check: check_marquee,
    },
    A11yRule {
        id: "blink",
        help: "<blink> elements are deprecated and must not be used",
        description: "Ensures <blink> elements are not used",
        severity: Severity::Serious,
        category: Category::Technical,
        wcag: ("WCAG 2.2.2", WcagLevel::A, "Pause, Stop, Hide", "Moving content can be paused, stopped, or hidden"),
        guidance: "Remove <blink> element - it is deprecated and causes accessibility issues",
        check: check_blink,
    },
    A11yRule {
        id: "list",
        help: "<ul> and <ol> must only directly contain <li>, <script> or <template> elements",
        description: "Ensures that lists are structured correctly",
        severity: Severity::Serious,
        category: Category::Structure,
        wcag: ("WCAG 1.3.1", WcagLevel::A, "Info and Relationships", "Structure can be programmatically determined"),
        guidance: "Ensure lists only contain li elements",
        check: check_list,
    },
    A11yRule {
        id: "listitem",
        help: "<li> elements must be contained in a <ul> or <ol>",
        description: "Ensures <li> elements are used semantically",
        severity: Severity::Serious,
        category: Category::Structure,
        wcag: ("WCAG 1.3.1", WcagLevel::A, "Info and Relationships", "Structure can be programmatically determined"),
        guidance: "Ensure list items are inside ul or ol elements",
        check: check_listitem,
    },
];

/// Accessibility rule module.
pub struct AccessibilityRules;

#[async_trait(?Send)]
impl RuleModule for AccessibilityRules {
    fn name(&self) -> &str {
        "Accessibility"
    }

    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome> {
        let mut out = AuditOutcome::new();
        for rule in &RULES {
            let findings = (rule.check)(ctx.page);
            if findings.is_empty() {
                out.pass(PendingCheck {
                    id: format!("pass-{}", rule.id),
                    name: rule.help.to_string(),
                    category: rule.category.as_str().to_string(),
                    description: rule.description.to_string(),
                });
                continue;
            }
            let help_url = format!("{}{}", HELP_BASE, rule.id);
            let (wcag_id, level, wcag_name, wcag_desc) = rule.wcag;
            for finding in findings {
                let fix = fix_guidance(rule, &finding);
                out.issue(
                    Issue::new(
                        ctx.ids.contextual("a11y", rule.id),
                        rule.id,
                        rule.severity,
                        rule.category.clone(),
                        rule.help,
                    )
                    .with_description(rule.description)
                    .with_help_url(&help_url)
                    .with_wcag(Wcag::new(wcag_id, level, wcag_name, wcag_desc))
                    .with_element(&finding.selector, &finding.html, &finding.summary)
                    .with_fix(fix, code_fix(rule.id, &finding.html)),
                );
            }
        }
        Ok(out)
    }
}

fn fix_guidance(rule: &A11yRule, finding: &Finding) -> String {
    if rule.id == "button-name" && finding.html.contains("aria-label") {
        return "Aria-label is present but may need improvement".to_string();
    }
    rule.guidance.to_string()
}

fn code_fix(rule_id: &str, html: &str) -> String {
    match rule_id {
        "image-alt" => r#"<img src="image.jpg" alt="[Describe what the image shows]">"#.to_string(),
        "button-name" => r#"<button aria-label="[purpose]">Button text</button>"#.to_string(),
        "link-name" => r##"<a href="#target">Link text</a>"##.to_string(),
        "label" => "<label for=\"input-id\">Label text</label>\n<input id=\"input-id\" type=\"text\">".to_string(),
        "document-title" => "<title>Page Title - Site Name</title>".to_string(),
        "heading-order" => "<!-- Follow order: h1, h2, h3 without skipping levels -->\n<h1>Main heading</h1>\n<h2>Subheading</h2>\n<h3>Sub-subheading</h3>".to_string(),
        "video-caption" => "<video controls>\n  <source src=\"video.mp4\" type=\"video/mp4\">\n  <track kind=\"captions\" src=\"captions.vtt\" srclang=\"en\">\n</video>".to_string(),
        _ => {
            let html = if html.is_empty() { "<element>" } else { html };
            format!("<!-- Fix the {} issue in the element: -->\n{}", rule_id, html)
        }
    }
}

/// Text, aria-label, aria-labelledby, title, or an image with alt text.
fn has_accessible_name(el: &ElementRef<'_>) -> bool {
    !dom::text(el).is_empty()
        || dom::non_empty_attr(el, "aria-label").is_some()
        || dom::non_empty_attr(el, "aria-labelledby").is_some()
        || dom::non_empty_attr(el, "title").is_some()
        || dom::select_in(*el, "img[alt]")
            .iter()
            .any(|img| dom::non_empty_attr(img, "alt").is_some())
}

fn is_presentational(el: &ElementRef<'_>) -> bool {
    matches!(dom::attr(el, "role"), Some("none") | Some("presentation"))
}

fn check_image_alt(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "img")
        .iter()
        .filter(|img| {
            dom::attr(img, "alt").is_none()
                && !is_presentational(img)
                && dom::non_empty_attr(img, "aria-label").is_none()
                && dom::non_empty_attr(img, "aria-labelledby").is_none()
        })
        .map(|img| Finding::at(img, "Element does not have an alt attribute"))
        .collect()
}

fn check_input_image_alt(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, r#"input[type="image"]"#)
        .iter()
        .filter(|input| {
            dom::non_empty_attr(input, "alt").is_none()
                && dom::non_empty_attr(input, "aria-label").is_none()
                && dom::non_empty_attr(input, "title").is_none()
        })
        .map(|input| Finding::at(input, "Element has no alt attribute or the alt attribute is empty"))
        .collect()
}

fn check_button_name(page: &Page) -> Vec<Finding> {
    let mut findings: Vec<Finding> = dom::select(&page.document, "button, [role=\"button\"]")
        .iter()
        .filter(|button| !has_accessible_name(button))
        .map(|button| Finding::at(button, "Element does not have inner text that is visible to screen readers"))
        .collect();
    findings.extend(
        dom::select(&page.document, r#"input[type="button"]"#)
            .iter()
            .filter(|input| {
                dom::non_empty_attr(input, "value").is_none()
                    && dom::non_empty_attr(input, "aria-label").is_none()
                    && dom::non_empty_attr(input, "title").is_none()
            })
            .map(|input| Finding::at(input, "Element has no value attribute or the value attribute is empty")),
    );
    findings
}

fn check_link_name(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "a[href]")
        .iter()
        .filter(|link| !has_accessible_name(link))
        .map(|link| Finding::at(link, "Element is in tab order and does not have accessible text"))
        .collect()
}

/// Ids referenced by `<label for>`.
fn label_targets(page: &Page) -> HashSet<&str> {
    dom::select(&page.document, "label[for]")
        .iter()
        .filter_map(|label| dom::non_empty_attr(label, "for"))
        .collect()
}

fn is_labelled(el: &ElementRef<'_>, targets: &HashSet<&str>) -> bool {
    if dom::non_empty_attr(el, "aria-label").is_some()
        || dom::non_empty_attr(el, "aria-labelledby").is_some()
        || dom::non_empty_attr(el, "title").is_some()
    {
        return true;
    }
    if dom::non_empty_attr(el, "id").is_some_and(|id| targets.contains(id)) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "label")
}

fn check_label(page: &Page) -> Vec<Finding> {
    let targets = label_targets(page);
    dom::select(&page.document, "input, textarea")
        .iter()
        .filter(|field| {
            let kind = dom::attr(field, "type").unwrap_or("text").to_ascii_lowercase();
            !matches!(kind.as_str(), "hidden" | "submit" | "button" | "reset" | "image")
        })
        .filter(|field| !is_labelled(field, &targets))
        .map(|field| Finding::at(field, "Form element does not have an implicit (wrapped) or explicit <label>"))
        .collect()
}

fn check_select_name(page: &Page) -> Vec<Finding> {
    let targets = label_targets(page);
    dom::select(&page.document, "select")
        .iter()
        .filter(|select| !is_labelled(select, &targets))
        .map(|select| Finding::at(select, "Select element does not have an accessible name"))
        .collect()
}

fn check_html_has_lang(page: &Page) -> Vec<Finding> {
    match dom::select_first(&page.document, "html") {
        Some(html) if dom::non_empty_attr(&html, "lang").is_none() => {
            vec![Finding::synthetic("html", "The <html> element does not have a lang attribute")]
        }
        _ => Vec::new(),
    }
}

/// Shape check for BCP 47 tags: a 2-3 letter primary subtag (or `x`/`i`
/// for private and grandfathered tags) followed by 1-8 char alphanumeric
/// subtags.
fn is_valid_lang(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or("");
    let primary_ok = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic())
        || primary.eq_ignore_ascii_case("x")
        || primary.eq_ignore_ascii_case("i");
    primary_ok && parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn check_valid_lang(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "[lang]")
        .iter()
        .filter_map(|el| {
            let lang = dom::attr(el, "lang")?.trim();
            if lang.is_empty() || is_valid_lang(lang) {
                None
            } else {
                Some(Finding::at(el, format!("Value of lang attribute not included in the list of valid languages: {}", lang)))
            }
        })
        .collect()
}

fn check_document_title(page: &Page) -> Vec<Finding> {
    let titled = dom::select_first(&page.document, "title")
        .map(|t| !dom::text(&t).is_empty())
        .unwrap_or(false);
    if titled {
        Vec::new()
    } else {
        vec![Finding::synthetic("html", "Document does not have a non-empty <title> element")]
    }
}

fn check_heading_order(page: &Page) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut previous: Option<u8> = None;
    for heading in dom::select(&page.document, "h1, h2, h3, h4, h5, h6") {
        let level = heading.value().name().as_bytes()[1] - b'0';
        if let Some(prev) = previous {
            if level > prev + 1 {
                findings.push(Finding::at(
                    &heading,
                    format!("Heading level jumps from h{} to h{}", prev, level),
                ));
            }
        }
        previous = Some(level);
    }
    findings
}

fn check_aria_roles(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "[role]")
        .iter()
        .filter_map(|el| {
            let role = dom::attr(el, "role")?.trim();
            if role.is_empty() {
                return None;
            }
            let valid = role
                .split_whitespace()
                .any(|r| ARIA_ROLES.contains(&r.to_ascii_lowercase().as_str()));
            (!valid).then(|| Finding::at(el, format!("Role must be one of the valid ARIA roles: {}", role)))
        })
        .collect()
}

fn check_tabindex(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "[tabindex]")
        .iter()
        .filter(|el| {
            dom::attr(el, "tabindex")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .is_some_and(|v| v > 0)
        })
        .map(|el| Finding::at(el, "Element has a tabindex greater than 0"))
        .collect()
}

fn check_duplicate_id(page: &Page) -> Vec<Finding> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let elements = dom::select(&page.document, "[id]");
    for el in &elements {
        if let Some(id) = dom::non_empty_attr(el, "id") {
            *counts.entry(id).or_default() += 1;
        }
    }
    let mut reported = HashSet::new();
    elements
        .iter()
        .filter_map(|el| {
            let id = dom::non_empty_attr(el, "id")?;
            let count = counts.get(id).copied().unwrap_or(0);
            (count > 1 && reported.insert(id))
                .then(|| Finding::at(el, format!("Document has multiple elements with the same id attribute: {}", id)))
        })
        .collect()
}

fn check_frame_title(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "iframe, frame")
        .iter()
        .filter(|frame| {
            dom::non_empty_attr(frame, "title").is_none()
                && dom::non_empty_attr(frame, "aria-label").is_none()
                && dom::non_empty_attr(frame, "aria-labelledby").is_none()
                && !is_presentational(frame)
        })
        .map(|frame| Finding::at(frame, "Element has no title attribute or the title attribute is empty"))
        .collect()
}

fn check_video_caption(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "video")
        .iter()
        .filter(|video| {
            !dom::select_in(**video, "track")
                .iter()
                .any(|t| dom::attr(t, "kind").is_some_and(|k| k.eq_ignore_ascii_case("captions")))
        })
        .map(|video| Finding::at(video, "The video element does not have a captions track"))
        .collect()
}

fn check_marquee(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "marquee")
        .iter()
        .map(|el| Finding::at(el, "Element is a <marquee>"))
        .collect()
}

fn check_blink(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "blink")
        .iter()
        .map(|el| Finding::at(el, "Element is a <blink>"))
        .collect()
}

fn check_list(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "ul, ol")
        .iter()
        .filter(|list| dom::attr(list, "role").is_none())
        .filter_map(|list| {
            let stray = list
                .children()
                .filter_map(ElementRef::wrap)
                .find(|child| !matches!(child.value().name(), "li" | "script" | "template"))?;
            Some(Finding::at(
                list,
                format!("List element has direct children that are not allowed: {}", stray.value().name()),
            ))
        })
        .collect()
}

fn check_listitem(page: &Page) -> Vec<Finding> {
    dom::select(&page.document, "li")
        .iter()
        .filter(|item| {
            let parent = item.parent().and_then(ElementRef::wrap);
            !parent.is_some_and(|p| {
                matches!(p.value().name(), "ul" | "ol" | "menu") || dom::attr(&p, "role") == Some("list")
            })
        })
        .map(|item| Finding::at(item, "List item does not have a <ul>, <ol> parent element"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdGenerator;

    async fn run(html: &str) -> AuditOutcome {
        let page = Page::from_html("https://example.com/", html);
        let ids = IdGenerator::new();
        AccessibilityRules
            .audit(&AuditContext { page: &page, ids: &ids })
            .await
            .unwrap()
    }

    fn rules(out: &AuditOutcome) -> Vec<&str> {
        out.issues.iter().map(|i| i.rule_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_accessible_page_passes_every_rule() {
        let html = r#"<!DOCTYPE html><html lang="en"><head><title>Home</title></head><body>
            <h1>Title</h1><h2>Section</h2>
            <img src="a.png" alt="A cat"><img src="spacer.gif" alt="">
            <a href="/x">More</a><button>Send</button>
            <label for="email">Email</label><input id="email" type="email">
            <label>Country <select><option>NZ</option></select></label>
            <ul><li>one</li></ul>
            <iframe src="/map" title="Map"></iframe>
            <div role="navigation" tabindex="0"></div>
            </body></html>"#;
        let out = run(html).await;
        assert!(out.issues.is_empty(), "{:?}", rules(&out));
        assert_eq!(out.passed.len(), RULES.len());
        assert!(out.passed.iter().any(|p| p.id == "pass-image-alt" && p.category == "images"));
    }

    #[tokio::test]
    async fn test_common_violations() {
        let html = r#"<html><head></head><body>
            <h1>Title</h1><h3>Skipped</h3>
            <img src="a.png"><a href="/x"></a><button></button>
            <input type="text"><div role="bogus"></div><span tabindex="3"></span>
            </body></html>"#;
        let out = run(html).await;
        assert_eq!(
            rules(&out),
            vec![
                "image-alt",
                "button-name",
                "link-name",
                "label",
                "html-has-lang",
                "document-title",
                "heading-order",
                "aria-roles",
                "tabindex",
            ]
        );
        let img = &out.issues[0];
        assert_eq!(img.severity, Severity::Critical);
        assert_eq!(img.category, Category::Images);
        assert_eq!(img.wcag.id, "WCAG 1.1.1");
        assert!(img.id.starts_with("a11y-image-alt-"));
        assert_eq!(img.help_url, "https://dequeuniversity.com/rules/axe/4.8/image-alt");
        assert_eq!(out.issues[6].element.failure_summary, "Heading level jumps from h1 to h3");
    }

    #[tokio::test]
    async fn test_structure_and_media_rules() {
        let html = r#"<!DOCTYPE html><html lang="en"><head><title>t</title></head><body>
            <ul><div>bad</div></ul><li>orphan</li>
            <video src="v.mp4"></video><iframe src="/x"></iframe>
            <p id="dup"></p><p id="dup"></p>
            <p lang="english-please">hi</p>
            </body></html>"#;
        let out = run(html).await;
        let found = rules(&out);
        for rule in ["valid-lang", "duplicate-id", "frame-title", "video-caption", "list", "listitem"] {
            assert!(found.contains(&rule), "missing {rule} in {found:?}");
        }
        assert_eq!(found.iter().filter(|r| **r == "duplicate-id").count(), 1);
    }

    #[test]
    fn test_lang_shapes() {
        assert!(is_valid_lang("en"));
        assert!(is_valid_lang("en-US"));
        assert!(is_valid_lang("zh-Hant-TW"));
        assert!(!is_valid_lang("english"));
        assert!(!is_valid_lang("en_US"));
    }

    #[test]
    fn test_button_fix_mentions_existing_label() {
        let finding = Finding::synthetic("button", "x");
        let with_label = Finding {
            html: r#"<button aria-label=" "></button>"#.to_string(),
            ..finding
        };
        assert_eq!(
            fix_guidance(&RULES[2], &with_label),
            "Aria-label is present but may need improvement"
        );
    }
}
