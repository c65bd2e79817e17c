//! Distill module - HTML to text
//!
//! Two independent pipelines behind one [`Distiller`]:
//! - full mode produces a [`PageRecord`] (title, metadata, main content, links)
//! - condensed mode produces a size-bounded HTML digest for the oracle
//!
//! Distillation never fails: unusable selectors are skipped and malformed
//! markup falls through to the documented fallbacks.

mod condensed;
mod full;
mod text;

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::{Link, PageMetadata};

pub use condensed::{is_non_result, is_search_url, is_spec_page, search_results, unwrap_redirect, SearchResults};
pub use full::{is_absolute_http, UNTITLED};
pub use text::{preview, truncate_with_marker, TRUNCATION_MARKER};

/// Which pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistillMode {
    Full,
    Condensed { budget_chars: usize },
}

/// Full-mode output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub metadata: PageMetadata,
    pub main_content: String,
    pub links: Vec<Link>,
}

/// Output of [`Distiller::distill`]
#[derive(Debug, Clone, PartialEq)]
pub enum Distilled {
    Full(PageRecord),
    Condensed(String),
}

/// Stateless entry point to both pipelines
#[derive(Debug, Clone, Copy, Default)]
pub struct Distiller;

impl Distiller {
    pub fn new() -> Self {
        Self
    }

    /// Run the pipeline selected by `mode`
    pub fn distill(&self, html: &str, source_url: &str, mode: DistillMode) -> Distilled {
        match mode {
            DistillMode::Full => Distilled::Full(self.extract(html, Some(source_url))),
            DistillMode::Condensed { budget_chars } => {
                Distilled::Condensed(self.condense(html, source_url, budget_chars))
            }
        }
    }

    /// Full extraction; relative links resolve against `base_url` when given
    pub fn extract(&self, html: &str, base_url: Option<&str>) -> PageRecord {
        let document = Html::parse_document(html);
        let base = parse_base(base_url);
        let metadata = full::extract_metadata(&document);

        PageRecord {
            title: metadata.title.clone(),
            main_content: full::extract_main_content(&document),
            links: full::extract_links(&document, base.as_ref()),
            metadata,
        }
    }

    pub fn extract_title(&self, html: &str) -> String {
        full::extract_title(&Html::parse_document(html))
    }

    pub fn extract_metadata(&self, html: &str) -> PageMetadata {
        full::extract_metadata(&Html::parse_document(html))
    }

    pub fn extract_main_content(&self, html: &str) -> String {
        full::extract_main_content(&Html::parse_document(html))
    }

    pub fn extract_links(&self, html: &str, base_url: Option<&str>) -> Vec<Link> {
        full::extract_links(&Html::parse_document(html), parse_base(base_url).as_ref())
    }

    pub fn extract_navigation_links(&self, html: &str, base_url: Option<&str>) -> Vec<Link> {
        full::extract_navigation_links(&Html::parse_document(html), parse_base(base_url).as_ref())
    }

    /// Resolved href of the page's "next page" link
    pub fn find_next_page(&self, html: &str, base_url: Option<&str>) -> Option<String> {
        full::find_next_page(&Html::parse_document(html), parse_base(base_url).as_ref())
    }

    /// Condensed digest of a page, cut to `budget_chars` characters
    pub fn condense(&self, html: &str, source_url: &str, budget_chars: usize) -> String {
        condensed::condense(html, source_url, budget_chars)
    }
}

fn parse_base(base_url: Option<&str>) -> Option<Url> {
    base_url.and_then(|base| Url::parse(base).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html>
        <head>
            <title>Rust 2024 Edition</title>
            <meta name="description" content="What changed">
        </head>
        <body>
            <nav><a href="/">Home</a></nav>
            <article><p>The new edition ships with async closures.</p>
                <a href="/docs/closures">Closures</a></article>
            <a href="?page=2" class="next">Older</a>
        </body>
    </html>"#;

    #[test]
    fn test_full_mode_record() {
        let distiller = Distiller::new();
        let Distilled::Full(record) = distiller.distill(
            ARTICLE,
            "https://blog.example.com/posts/edition",
            DistillMode::Full,
        ) else {
            panic!("expected a full record");
        };

        assert_eq!(record.title, "Rust 2024 Edition");
        assert_eq!(record.metadata.title, record.title);
        assert_eq!(record.metadata.description, "What changed");
        assert_eq!(
            record.main_content,
            "The new edition ships with async closures. Closures"
        );
        assert_eq!(
            record.links,
            vec![
                Link::new("https://blog.example.com/", "Home"),
                Link::new("https://blog.example.com/docs/closures", "Closures"),
                Link::new("https://blog.example.com/posts/edition?page=2", "Older"),
            ]
        );
    }

    #[test]
    fn test_extract_without_base_keeps_relative_links() {
        let record = Distiller::new().extract(ARTICLE, None);
        assert_eq!(record.links[0].url, "/");
    }

    #[test]
    fn test_next_page_via_distiller() {
        let next = Distiller::new().find_next_page(ARTICLE, Some("https://blog.example.com/posts/edition"));
        assert_eq!(next.as_deref(), Some("https://blog.example.com/posts/edition?page=2"));
    }

    #[test]
    fn test_condensed_mode() {
        let out = Distiller::new().distill(
            ARTICLE,
            "https://blog.example.com/posts/edition",
            DistillMode::Condensed { budget_chars: 8000 },
        );
        assert_eq!(
            out,
            Distilled::Condensed(
                "<html><body><h1>Rust 2024 Edition</h1><p>The new edition ships with async closures.</p></body></html>"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_garbage_input_degrades() {
        let distiller = Distiller::new();
        let record = distiller.extract("<<<not html at all", None);
        assert_eq!(record.title, UNTITLED);
        assert!(record.links.is_empty());
        assert_eq!(distiller.extract_title(""), UNTITLED);
        assert_eq!(distiller.extract_main_content(""), "");
    }
}
