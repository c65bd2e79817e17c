//! Web tools offered to the decision oracle
//!
//! Each tool runs on the session's navigation client. Fetching tools record
//! the title of every page they load so visits can be labelled later.

use std::collections::HashMap;

use scraper::Html;
use tokio::time::Instant;

use crate::core::config::DistillConfig;
use crate::core::{HttpMethod, Result};
use crate::distill::{is_absolute_http, search_results, truncate_with_marker, Distiller};
use crate::navigation::{NavigationClient, Payload};

/// Sentinel returned by `extract_links` when nothing qualifies
pub const NO_LINKS_FOUND: &str = "No links found";

/// Results listed by the `search` tool
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Search URL for a query: `prefix` followed by the form-encoded query
pub fn search_url(prefix: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{}{}", prefix, encoded)
}

/// Tool implementations sharing one distiller and a per-session title cache
#[derive(Debug, Clone)]
pub struct WebTools {
    distiller: Distiller,
    limits: DistillConfig,
    search_url: String,
    titles: HashMap<String, String>,
}

impl WebTools {
    pub fn new(limits: DistillConfig, search_url: impl Into<String>) -> Self {
        Self {
            distiller: Distiller::new(),
            limits,
            search_url: search_url.into(),
            titles: HashMap::new(),
        }
    }

    pub fn search_url_for(&self, query: &str) -> String {
        search_url(&self.search_url, query)
    }

    /// Run a search and render the top five results as a minimal HTML list
    pub async fn search(
        &mut self,
        client: &mut NavigationClient,
        deadline: Instant,
        query: &str,
    ) -> Result<String> {
        let url = self.search_url_for(query);
        tracing::info!(query, "searching");
        let html = self.load(client, deadline, &url).await?;
        Ok(search_results(&Html::parse_document(&html)).render_top(SEARCH_RESULT_LIMIT))
    }

    /// Fetch a page and return its condensed digest
    pub async fn browse(
        &mut self,
        client: &mut NavigationClient,
        deadline: Instant,
        url: &str,
    ) -> Result<String> {
        tracing::info!(url, "browsing");
        let html = self.load(client, deadline, url).await?;
        Ok(self.distiller.condense(&html, url, self.limits.condensed_budget))
    }

    /// Cut raw HTML to the content budget
    pub fn extract_content(&self, html: &str) -> String {
        truncate_with_marker(html, self.limits.content_budget)
    }

    /// Absolute http(s) links in document order, capped at `max_links`
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let links: Vec<String> = self
            .distiller
            .extract_links(html, None)
            .into_iter()
            .map(|link| link.url)
            .filter(|url| is_absolute_http(url))
            .take(self.limits.max_links)
            .collect();

        if links.is_empty() {
            vec![NO_LINKS_FOUND.to_string()]
        } else {
            links
        }
    }

    /// Title recorded when `url` was last fetched by a tool
    pub fn title_for(&self, url: &str) -> Option<&str> {
        self.titles.get(url).map(String::as_str)
    }

    async fn load(
        &mut self,
        client: &mut NavigationClient,
        deadline: Instant,
        url: &str,
    ) -> Result<String> {
        let html = client
            .fetch_before(deadline, url, HttpMethod::Get, Payload::None)
            .await?;
        self.titles
            .insert(url.to_string(), self.distiller.extract_title(&html));
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HttpConfig;
    use crate::distill::TRUNCATION_MARKER;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tools(search_url: &str) -> WebTools {
        WebTools::new(DistillConfig::default(), search_url)
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[test]
    fn test_search_url_encodes_query() {
        let web = tools("https://www.google.com/search?q=");
        assert_eq!(
            web.search_url_for("iphone 15 pro battery"),
            "https://www.google.com/search?q=iphone+15+pro+battery"
        );
        assert_eq!(web.search_url_for("a&b"), "https://www.google.com/search?q=a%26b");
    }

    #[test]
    fn test_extract_content_truncates() {
        let web = tools("");
        let html = "a".repeat(9000);
        let out = web.extract_content(&html);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(out.chars().count(), 8000 + TRUNCATION_MARKER.chars().count());
        assert_eq!(web.extract_content("<p>short</p>"), "<p>short</p>");
    }

    #[test]
    fn test_extract_links_absolute_only_and_capped() {
        let web = tools("");
        let mut html = String::from(r#"<a href="/relative">r</a><a href="javascript:x()">j</a>"#);
        for i in 0..15 {
            html.push_str(&format!(r#"<a href="https://site{i}.example.com/">s</a>"#));
        }
        let links = web.extract_links(&html);
        assert_eq!(links.len(), 10);
        assert_eq!(links[0], "https://site0.example.com/");
        assert_eq!(links[9], "https://site9.example.com/");
    }

    #[test]
    fn test_extract_links_sentinel() {
        let web = tools("");
        assert_eq!(web.extract_links("<p>none</p>"), vec![NO_LINKS_FOUND.to_string()]);
    }

    #[tokio::test]
    async fn test_search_and_browse_record_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust async"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><head><title>rust async - Search</title></head><body>
                    <div><h3>Async book</h3><a href="{0}/book">Async book</a></div>
                </body></html>"#,
                server.uri()
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>Async Book</title></head><body><p>Futures are lazy.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let mut web = tools(&format!("{}/search?q=", server.uri()));
        let mut client = NavigationClient::new(HttpConfig::default());

        let results = web.search(&mut client, deadline(), "rust async").await.unwrap();
        assert!(results.contains(&format!("<a href='{}/book'>Async book</a>", server.uri())));

        let book_url = format!("{}/book", server.uri());
        let page = web.browse(&mut client, deadline(), &book_url).await.unwrap();
        assert_eq!(
            page,
            "<html><body><h1>Async Book</h1><p>Futures are lazy.</p></body></html>"
        );
        assert_eq!(web.title_for(&book_url), Some("Async Book"));
        assert_eq!(client.history().len(), 2);
    }

    #[tokio::test]
    async fn test_search_lists_at_most_five_results() {
        let server = MockServer::start().await;
        let mut body = String::from("<html><body>");
        for i in 0..8 {
            body.push_str(&format!(
                r#"<div><h3>Result {i}</h3><a href="https://r{i}.example.com/">Result {i}</a></div>"#
            ));
        }
        body.push_str("</body></html>");
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let mut web = tools(&format!("{}/search?q=", server.uri()));
        let mut client = NavigationClient::new(HttpConfig::default());
        let results = web.search(&mut client, deadline(), "many").await.unwrap();

        assert_eq!(results.matches("<li>").count(), SEARCH_RESULT_LIMIT);
        assert!(results.contains("https://r0.example.com/"));
        assert!(results.contains("https://r4.example.com/"));
        assert!(!results.contains("https://r5.example.com/"));
    }

    #[tokio::test]
    async fn test_browse_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut web = tools("");
        let mut client = NavigationClient::new(HttpConfig::default());
        let err = web
            .browse(&mut client, deadline(), &server.uri())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(web.title_for(&server.uri()), None);
    }
}
