//! Full-mode distillation
//!
//! Selector cascades that turn a parsed document into title, metadata,
//! main content, links, and pagination.

use scraper::{ElementRef, Html};
use url::Url;

use crate::core::{Link, PageMetadata};
use crate::distill::text::{collapse_whitespace, element_text, select_all, select_first, selector, text_excluding};

pub const UNTITLED: &str = "Untitled Page";

const PRODUCT_HEADER: &str = ".product-header";

/// Main-content containers, in priority order
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"div[role="main"]"#,
    ".content",
    "#content",
    ".post",
    ".article",
    ".entry",
    ".page-content",
    ".main-content",
    PRODUCT_HEADER,
];

/// Page chrome dropped when falling back to the whole body
const CHROME_SELECTORS: &[&str] = &["nav", "header", "footer", "aside", ".sidebar", "#sidebar"];

const NAV_CONTAINERS: &str = "nav, .nav, .navigation, .menu, header ul, .navbar";

enum NextPageRule {
    Css(&'static str),
    AnchorText(&'static str),
}

/// "Next page" probes; the first rule that yields a usable href wins
const NEXT_PAGE_RULES: &[NextPageRule] = &[
    NextPageRule::Css("a.next"),
    NextPageRule::Css(".next a"),
    NextPageRule::Css(r#"a[rel="next"]"#),
    NextPageRule::AnchorText("next"),
    NextPageRule::Css(".pagination a.next"),
    NextPageRule::Css(r#".pagination a[rel="next"]"#),
    NextPageRule::Css(r#"a[aria-label="Next"]"#),
    NextPageRule::Css(".next-page"),
    NextPageRule::Css("#next-page"),
];

fn first_text(document: &Html, css: &str) -> Option<String> {
    let text = element_text(select_first(document, css)?);
    (!text.is_empty()).then_some(text)
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let content = select_first(document, css)?.value().attr("content")?.trim();
    (!content.is_empty()).then(|| content.to_string())
}

/// Title cascade: `<title>`, first `<h1>`, `og:title`, then [`UNTITLED`]
pub fn extract_title(document: &Html) -> String {
    first_text(document, "title")
        .or_else(|| first_text(document, "h1"))
        .or_else(|| meta_content(document, r#"meta[property="og:title"]"#))
        .unwrap_or_else(|| UNTITLED.to_string())
}

pub fn extract_metadata(document: &Html) -> PageMetadata {
    let meta = |css: &str| meta_content(document, css).unwrap_or_default();

    let og_description = meta(r#"meta[property="og:description"]"#);
    let description = meta_content(document, r#"meta[name="description"]"#)
        .unwrap_or_else(|| og_description.clone());
    let canonical_url = meta_content(document, r#"meta[property="og:url"]"#)
        .or_else(|| {
            select_first(document, r#"link[rel="canonical"]"#)
                .and_then(|link| link.value().attr("href"))
                .map(|href| href.trim().to_string())
        })
        .unwrap_or_default();

    PageMetadata {
        title: extract_title(document),
        description,
        keywords: meta(r#"meta[name="keywords"]"#),
        author: meta(r#"meta[name="author"]"#),
        published_date: meta(r#"meta[property="article:published_time"]"#),
        image: meta(r#"meta[property="og:image"]"#),
        canonical_url,
        og_title: meta(r#"meta[property="og:title"]"#),
        og_description,
    }
}

/// Main content cascade: product header, content containers, chrome-free
/// body, whole document.
pub fn extract_main_content(document: &Html) -> String {
    let header = select_first(document, PRODUCT_HEADER);
    let mut parts = Vec::new();

    if let Some(header) = header {
        parts.push(element_text(header));
    }

    for css in CONTENT_SELECTORS {
        let Some(element) = select_first(document, css) else {
            continue;
        };
        if header.is_some_and(|h| h.id() == element.id()) {
            continue;
        }
        parts.push(element_text(element));
    }

    if !parts.is_empty() {
        return collapse_whitespace(&parts.join(" "));
    }

    if let Some(body) = select_first(document, "body") {
        let mut chrome = Vec::new();
        for css in CHROME_SELECTORS {
            if let Some(selector) = selector(css) {
                chrome.extend(body.select(&selector));
            }
        }
        let text = text_excluding(body, &chrome);
        if !text.is_empty() {
            return text;
        }
    }

    element_text(document.root_element())
}

/// Every usable anchor in document order
pub fn extract_links(document: &Html, base: Option<&Url>) -> Vec<Link> {
    select_all(document, "a[href]")
        .into_iter()
        .filter_map(|anchor| link_from_anchor(anchor, base))
        .collect()
}

/// Anchors inside navigation chrome, each anchor reported once
pub fn extract_navigation_links(document: &Html, base: Option<&Url>) -> Vec<Link> {
    let Some(anchor_selector) = selector("a[href]") else {
        return Vec::new();
    };

    let mut seen = Vec::new();
    let mut links = Vec::new();
    for container in select_all(document, NAV_CONTAINERS) {
        for anchor in container.select(&anchor_selector) {
            if seen.contains(&anchor.id()) {
                continue;
            }
            seen.push(anchor.id());
            if let Some(link) = link_from_anchor(anchor, base) {
                links.push(link);
            }
        }
    }
    links
}

/// Resolved URL of the "next page" link, if any
pub fn find_next_page(document: &Html, base: Option<&Url>) -> Option<String> {
    for rule in NEXT_PAGE_RULES {
        let href = match rule {
            NextPageRule::Css(css) => select_first(document, css)
                .and_then(|element| element.value().attr("href"))
                .and_then(usable_href),
            NextPageRule::AnchorText(needle) => select_all(document, "a")
                .into_iter()
                .filter(|anchor| element_text(*anchor).to_lowercase().contains(needle))
                .find_map(|anchor| anchor.value().attr("href").and_then(usable_href)),
        };

        if let Some(href) = href {
            return Some(resolve_href(href, base));
        }
    }
    None
}

fn usable_href(href: &str) -> Option<&str> {
    let href = href.trim();
    (!href.is_empty() && !href.starts_with('#')).then_some(href)
}

fn link_from_anchor(anchor: ElementRef<'_>, base: Option<&Url>) -> Option<Link> {
    let href = usable_href(anchor.value().attr("href")?)?;
    if href.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    Some(Link::new(resolve_href(href, base), element_text(anchor)))
}

pub fn is_absolute_http(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

fn resolve_href(href: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) if !is_absolute_http(href) => base
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string()),
        _ => href.to_string(),
    }
}
