//! Condensed-mode distillation
//!
//! Reduces a fetched document to a small HTML digest that fits an oracle's
//! context: a result list for search pages, matched spec text for product
//! spec pages, and title plus leading paragraphs for everything else.

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::core::Link;
use crate::distill::full::is_absolute_http;
use crate::distill::text::{element_text, escape_html, select_all, selector, truncate_with_marker};

const MAX_RESULTS: usize = 5;
const MAX_PARAGRAPHS: usize = 5;
const PARAGRAPH_BUDGET: usize = 3000;

pub const UNKNOWN_TITLE: &str = "Unknown Title";

const SEARCH_PAGE_MARKERS: &[&str] = &["google.com/search", "bing.com/search", "duckduckgo.com/html"];

/// Links that are search-engine plumbing rather than results
const NON_RESULT_DOMAINS: &[&str] = &[
    "google.com/search",
    "accounts.google",
    "maps.google",
    "translate.google",
    "webcache.googleusercontent",
];

const SPEC_PAGE_MARKERS: &[&str] = &["iphone-15-pro", "iphone-16-pro", "/specs", "tech-specs"];

/// Battery-life matchers, most specific first; group 1 is the hit
const BATTERY_PATTERNS: &[&str] = &[
    r"(?is)<[^>]*>.*?Battery.*?(?:<[^>]*>){1,5}((?:Up to|All-day).*?(?:hour|hrs|playback|mAh).*?)(?:<[^>]*>){1,3}",
    r"(?is)Battery life(?:[^<]*<[^>]*>){1,3}([^<]*(?:hour|hrs|Up to|playback)[^<]*)",
    r"(?is)Battery(?:[^<]*<[^>]*>){1,3}([^<]*(?:hour|hrs|Up to|playback)[^<]*)",
];

pub fn is_search_url(url: &str) -> bool {
    SEARCH_PAGE_MARKERS.iter().any(|marker| url.contains(marker))
}

pub fn is_spec_page(url: &str) -> bool {
    SPEC_PAGE_MARKERS.iter().any(|marker| url.contains(marker))
}

pub fn is_non_result(url: &str) -> bool {
    NON_RESULT_DOMAINS.iter().any(|domain| url.contains(domain))
}

/// Turn a search-engine redirect (`/url?q=<target>&...`) into its target
pub fn unwrap_redirect(href: &str) -> String {
    let Some(query) = href
        .strip_prefix("/url?")
        .or_else(|| href.split_once("/url?").map(|(_, q)| q))
    else {
        return href.to_string();
    };

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, target)| target.into_owned())
        .filter(|target| is_absolute_http(target))
        .unwrap_or_else(|| href.to_string())
}

/// Results scraped from a search-engine page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Heading + link pairs
    pub titled: Vec<Link>,
    /// Further result links without a heading
    pub untitled: Vec<String>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.titled.is_empty() && self.untitled.is_empty()
    }

    /// Every result URL, titled results first
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.titled
            .iter()
            .map(|link| link.url.as_str())
            .chain(self.untitled.iter().map(String::as_str))
    }

    /// Minimal HTML list of the results
    pub fn render(&self) -> String {
        render_list(self.entries())
    }

    /// Like [`render`](Self::render), but at most `limit` entries: titled
    /// results first, topped up from the untitled links
    pub fn render_top(&self, limit: usize) -> String {
        render_list(self.entries().take(limit))
    }

    /// `(url, text)` pairs in display order
    fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.titled
            .iter()
            .map(|link| (link.url.as_str(), link.text.as_str()))
            .chain(self.untitled.iter().map(|url| (url.as_str(), url.as_str())))
    }
}

fn render_list<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let items: String = entries.map(|(url, text)| list_item(url, text)).collect();

    let mut html = String::from("<html><body><h1>Search Results</h1>");
    if items.is_empty() {
        html.push_str("<p>No results found.</p>");
    } else {
        html.push_str("<ul>");
        html.push_str(&items);
        html.push_str("</ul>");
    }
    html.push_str("</body></html>");
    html
}

fn list_item(url: &str, text: &str) -> String {
    format!("<li><a href='{}'>{}</a></li>", escape_html(url), escape_html(text))
}

/// Collect up to five titled results and up to five more untitled links
pub fn search_results(document: &Html) -> SearchResults {
    let mut results = SearchResults::default();

    for heading in select_all(document, "h3") {
        if results.titled.len() >= MAX_RESULTS {
            break;
        }
        let Some(href) = heading_href(heading) else {
            continue;
        };
        let url = unwrap_redirect(href);
        let title = element_text(heading);
        if url.contains("http") && !title.is_empty() {
            results.titled.push(Link::new(url, title));
        }
    }

    for anchor in select_all(document, "a[href]") {
        if results.untitled.len() >= MAX_RESULTS {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = unwrap_redirect(href.trim());
        if !is_absolute_http(&url) || is_non_result(&url) {
            continue;
        }
        let already_listed = results.titled.iter().any(|link| link.url == url)
            || results.untitled.contains(&url);
        if !already_listed {
            results.untitled.push(url);
        }
    }

    results
}

/// The link a result heading belongs to: an enclosing anchor, else the
/// first anchor beside it.
fn heading_href(heading: ElementRef<'_>) -> Option<&str> {
    let enclosing = heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "a")
        .and_then(|anchor| anchor.value().attr("href"));
    if enclosing.is_some() {
        return enclosing;
    }

    let anchors = selector("a[href]")?;
    let parent = heading.parent().and_then(ElementRef::wrap)?;
    let href = parent.select(&anchors).next()?.value().attr("href");
    href
}

/// Battery-life text from a product spec page, if any matcher hits
pub fn spec_sheet(html: &str) -> Option<String> {
    let tags = Regex::new(r"<[^>]+>").ok()?;

    for pattern in BATTERY_PATTERNS {
        let Ok(matcher) = Regex::new(pattern) else {
            continue;
        };
        let hits: Vec<String> = matcher
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|hit| tags.replace_all(hit.as_str(), " ").split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|hit| !hit.is_empty())
            .take(MAX_RESULTS)
            .collect();

        if !hits.is_empty() {
            return Some(format!(
                "<html><body><h1>Extracted Product Information</h1><h2>Battery</h2><p>{}</p></body></html>",
                escape_html(&hits.join(" "))
            ));
        }
    }
    None
}

/// Title and the leading paragraphs of an ordinary page
pub fn generic_page(document: &Html) -> String {
    let title = select_all(document, "title")
        .into_iter()
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let mut html = format!("<html><body><h1>{}</h1>", escape_html(&title));
    let mut used = 0;
    for paragraph in select_all(document, "p").into_iter().take(MAX_PARAGRAPHS) {
        if used >= PARAGRAPH_BUDGET {
            break;
        }
        let text = element_text(paragraph);
        if text.is_empty() {
            continue;
        }
        used += text.chars().count();
        html.push_str(&format!("<p>{}</p>", escape_html(&text)));
    }
    html.push_str("</body></html>");
    html
}

/// Condense a fetched document, then cut it to `budget_chars`
pub fn condense(html: &str, source_url: &str, budget_chars: usize) -> String {
    let digest = if is_search_url(source_url) {
        search_results(&Html::parse_document(html)).render()
    } else {
        let spec = is_spec_page(source_url).then(|| spec_sheet(html)).flatten();
        spec.unwrap_or_else(|| generic_page(&Html::parse_document(html)))
    };
    truncate_with_marker(&digest, budget_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distill::text::TRUNCATION_MARKER;

    const GOOGLE_PAGE: &str = r#"<html><body>
        <div class="g"><a href="https://www.apple.com/iphone-15-pro/specs/"><h3>iPhone 15 Pro - <b>Tech Specs</b></h3></a></div>
        <div class="g"><h3>Battery review</h3><a href="/url?q=https://reviews.example.com/battery&amp;sa=U">link</a></div>
        <a href="https://accounts.google.com/login">Sign in</a>
        <a href="https://www.google.com/search?q=more">More</a>
        <a href="https://news.example.com/a">News A</a>
        <a href="https://news.example.com/a">News A again</a>
        <a href="/relative">Relative</a>
    </body></html>"#;

    #[test]
    fn test_url_classification() {
        assert!(is_search_url("https://www.google.com/search?q=x"));
        assert!(is_search_url("https://duckduckgo.com/html/?q=x"));
        assert!(!is_search_url("https://example.com/search"));
        assert!(is_spec_page("https://www.apple.com/iphone-16-pro/specs/"));
        assert!(!is_spec_page("https://example.com/blog"));
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("/url?q=https://a.example.com/x%20y&sa=U"),
            "https://a.example.com/x y"
        );
        assert_eq!(unwrap_redirect("https://b.example.com/"), "https://b.example.com/");
        assert_eq!(unwrap_redirect("/url?sa=U"), "/url?sa=U");
    }

    #[test]
    fn test_search_results_titled_and_untitled() {
        let results = search_results(&Html::parse_document(GOOGLE_PAGE));
        assert_eq!(
            results.titled,
            vec![
                Link::new("https://www.apple.com/iphone-15-pro/specs/", "iPhone 15 Pro - Tech Specs"),
                Link::new("https://reviews.example.com/battery", "Battery review"),
            ]
        );
        assert_eq!(results.untitled, vec!["https://news.example.com/a".to_string()]);
    }

    #[test]
    fn test_search_results_cap_at_five() {
        let mut html = String::from("<html><body>");
        for i in 0..8 {
            html.push_str(&format!(r#"<div><h3>R{i}</h3><a href="https://r{i}.example.com/">x</a></div>"#));
        }
        for i in 0..8 {
            html.push_str(&format!(r#"<a href="https://u{i}.example.com/">u</a>"#));
        }
        html.push_str("</body></html>");

        let results = search_results(&Html::parse_document(&html));
        assert_eq!(results.titled.len(), 5);
        assert_eq!(
            results.untitled,
            vec![
                "https://r5.example.com/",
                "https://r6.example.com/",
                "https://r7.example.com/",
                "https://u0.example.com/",
                "https://u1.example.com/",
            ]
        );
    }

    #[test]
    fn test_render_top_fills_from_untitled() {
        let results = search_results(&Html::parse_document(GOOGLE_PAGE));
        let out = results.render_top(2);
        assert_eq!(out.matches("<li>").count(), 2);
        assert!(!out.contains("news.example.com"));

        let only_untitled = SearchResults {
            titled: vec![Link::new("https://t.example.com/", "T")],
            untitled: (0..8).map(|i| format!("https://u{i}.example.com/")).collect(),
        };
        let out = only_untitled.render_top(5);
        assert_eq!(out.matches("<li>").count(), 5);
        assert!(out.contains("<li><a href='https://t.example.com/'>T</a></li><li><a href='https://u0.example.com/'>"));
        assert!(!out.contains("u4.example.com"));

        assert!(SearchResults::default().render_top(5).contains("<p>No results found.</p>"));
    }

    #[test]
    fn test_empty_search_renders_placeholder() {
        let out = condense(
            "<html><body><p>Nothing</p></body></html>",
            "https://www.google.com/search?q=zzz",
            8000,
        );
        assert_eq!(
            out,
            "<html><body><h1>Search Results</h1><p>No results found.</p></body></html>"
        );
    }

    #[test]
    fn test_search_render() {
        let out = condense(GOOGLE_PAGE, "https://www.google.com/search?q=iphone", 8000);
        assert!(out.starts_with("<html><body><h1>Search Results</h1><ul>"));
        assert!(out.contains(
            "<li><a href='https://reviews.example.com/battery'>Battery review</a></li>"
        ));
        assert!(!out.contains("accounts.google"));
    }

    #[test]
    fn test_spec_page_battery() {
        let html = r#"<html><body><div><h3>Battery life</h3><ul><li>Up to 23 hours video playback</li></ul></div></body></html>"#;
        let out = condense(html, "https://www.apple.com/iphone-15-pro/specs/", 8000);
        assert!(out.starts_with("<html><body><h1>Extracted Product Information</h1><h2>Battery</h2><p>"));
        assert!(out.contains("Up to 23 hours video playback"));
    }

    #[test]
    fn test_spec_page_without_hits_is_generic() {
        let html = "<html><head><title>Specs</title></head><body><p>Display only.</p></body></html>";
        let out = condense(html, "https://example.com/tech-specs", 8000);
        assert_eq!(out, "<html><body><h1>Specs</h1><p>Display only.</p></body></html>");
    }

    #[test]
    fn test_generic_page_limits_paragraphs() {
        let mut html = String::from("<html><body>");
        for i in 0..8 {
            html.push_str(&format!("<p>Paragraph {i} &lt;ok&gt;</p>"));
        }
        html.push_str("</body></html>");

        let out = condense(&html, "https://example.com/post", 8000);
        assert!(out.starts_with("<html><body><h1>Unknown Title</h1>"));
        assert_eq!(out.matches("<p>").count(), 5);
        assert!(out.contains("<p>Paragraph 0 &lt;ok&gt;</p>"));
        assert!(!out.contains("Paragraph 5"));
    }

    #[test]
    fn test_condense_truncates_to_budget() {
        let body = "x".repeat(500);
        let html = format!("<html><head><title>T</title></head><body><p>{body}</p></body></html>");
        let out = condense(&html, "https://example.com/", 100);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(out.chars().count(), 100 + TRUNCATION_MARKER.chars().count());
    }
}
