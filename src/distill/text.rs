//! Text helpers shared by both distillation modes

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Appended when output is cut to a character budget
pub const TRUNCATION_MARKER: &str = "... [Content truncated due to size]";

/// Elements whose content is never page text
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Parse a CSS selector; the fixed selector tables are all valid, so a
/// failure only skips that entry.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub(crate) fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    document.select(&selector).next()
}

pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// Collapse every whitespace run to one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, text nodes joined by single spaces
pub fn element_text(element: ElementRef<'_>) -> String {
    text_excluding(element, &[])
}

/// Visible text of an element, skipping the subtrees rooted at `excluded`
pub fn text_excluding(element: ElementRef<'_>, excluded: &[ElementRef<'_>]) -> String {
    let mut parts = Vec::new();
    collect_text(element, excluded, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text(element: ElementRef<'_>, excluded: &[ElementRef<'_>], out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(el) => {
                if NON_TEXT_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    if excluded.iter().any(|skip| skip.id() == child_element.id()) {
                        continue;
                    }
                    collect_text(child_element, excluded, out);
                }
            }
            _ => {}
        }
    }
}

/// Cut `text` to at most `budget` characters, appending the marker when cut
pub fn truncate_with_marker(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Cut `text` to at most `limit` characters, appending `...` when cut
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Minimal escaping for text placed inside generated HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
