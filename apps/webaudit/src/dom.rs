//! DOM query helpers shared by the rule modules.

use crate::models::ELEMENT_HTML_LIMIT;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

/// Select every element matching `css`. An unparsable selector yields no
/// matches and a warning instead of an error.
pub fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => doc.select(&sel).collect(),
        Err(e) => {
            warn!(selector = css, error = %e, "invalid selector");
            Vec::new()
        }
    }
}

/// First element matching `css`.
pub fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    select(doc, css).into_iter().next()
}

/// Select within a subtree.
pub fn select_in<'a>(el: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => el.select(&sel).collect(),
        Err(e) => {
            warn!(selector = css, error = %e, "invalid selector");
            Vec::new()
        }
    }
}

pub fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Attribute value, trimmed, treating blank values as absent.
pub fn non_empty_attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    attr(el, name).map(str::trim).filter(|v| !v.is_empty())
}

/// Visible text content, whitespace-collapsed.
pub fn text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outer markup capped at the issue excerpt limit.
pub fn excerpt(el: &ElementRef<'_>) -> String {
    el.html().chars().take(ELEMENT_HTML_LIMIT).collect()
}

/// CSS path from the root to `el`: `tag#id` or `tag.class1.class2` per
/// level, joined with ` > `.
pub fn build_selector(el: &ElementRef<'_>) -> String {
    let mut path: Vec<String> = Vec::new();
    let mut current = Some(*el);
    while let Some(node) = current {
        let value = node.value();
        let mut part = value.name().to_string();
        if let Some(id) = value.id() {
            part.push('#');
            part.push_str(id);
        } else {
            let classes: Vec<&str> = value.classes().take(2).collect();
            if !classes.is_empty() {
                part.push('.');
                part.push_str(&classes.join("."));
            }
        }
        path.push(part);
        current = node.parent().and_then(ElementRef::wrap);
    }
    path.reverse();
    path.join(" > ")
}

/// Name of the document's doctype, if it declares one.
pub fn doctype_name(doc: &Html) -> Option<&str> {
    doc.tree.root().children().find_map(|node| match node.value() {
        Node::Doctype(doctype) => Some(doctype.name()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_selector_uses_id_then_classes() {
        let doc = Html::parse_document(
            r#"<html><body><div class="a b c"><span id="x">hi</span></div></body></html>"#,
        );
        let span = select_first(&doc, "span").unwrap();
        assert_eq!(build_selector(&span), "html > body > div.a.b > span#x");
    }

    #[test]
    fn test_invalid_selector_yields_nothing() {
        let doc = Html::parse_document("<p>x</p>");
        assert!(select(&doc, "p[[").is_empty());
    }

    #[test]
    fn test_text_collapses_whitespace() {
        let doc = Html::parse_document("<a href='#'>  Read\n   more  </a>");
        let a = select_first(&doc, "a").unwrap();
        assert_eq!(text(&a), "Read more");
    }

    #[test]
    fn test_doctype_detection() {
        let html5 = Html::parse_document("<!DOCTYPE html><html></html>");
        assert_eq!(doctype_name(&html5), Some("html"));
        let bare = Html::parse_document("<html></html>");
        assert_eq!(doctype_name(&bare), None);
    }
}
