//! Navigation client
//!
//! Owns one reusable HTTP session with browser-like headers and keeps an
//! append-only history of every response received.

use chrono::Utc;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, StatusCode};
use tokio::time::{timeout_at, Instant};
use url::Url;

use crate::core::config::HttpConfig;
use crate::core::{BrowseError, HttpMethod, NavigationHistoryEntry, Result};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Request body or parameters for a navigation
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    None,
    /// Appended to the URL as a query string
    Query(Vec<(String, String)>),
    /// Sent as an URL-encoded form body
    Form(Vec<(String, String)>),
    /// Sent as a JSON body
    Json(serde_json::Value),
}

/// HTTP client that behaves like a desktop browser.
///
/// Not meant to be shared between concurrent sessions: every operation that
/// touches the history takes `&mut self`.
pub struct NavigationClient {
    config: HttpConfig,
    session: Option<Client>,
    history: Vec<NavigationHistoryEntry>,
}

impl NavigationClient {
    /// Create a client; the network session is created on first use
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            session: None,
            history: Vec::new(),
        }
    }

    /// Create the underlying session if it does not exist yet
    pub fn connect(&mut self) -> Result<&Client> {
        if self.session.is_none() {
            let client = self.build_session()?;
            tracing::debug!(user_agent = %self.config.user_agent, "opened navigation session");
            self.session = Some(client);
        }

        self.session
            .as_ref()
            .ok_or_else(|| BrowseError::network("navigation session unavailable"))
    }

    fn build_session(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        let language = HeaderValue::from_str(&self.config.accept_language)
            .map_err(|e| BrowseError::config(format!("Invalid Accept-Language: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        Client::builder()
            .user_agent(self.config.user_agent.clone())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(self.config.timeout())
            .build()
            .map_err(|e| BrowseError::network(format!("Failed to create HTTP client: {}", e)))
    }

    /// Whether the network session is open
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// GET a document, optionally with query parameters
    pub async fn get(&mut self, url: &str, params: Option<Vec<(String, String)>>) -> Result<String> {
        let payload = params.map(Payload::Query).unwrap_or_default();
        self.fetch(url, HttpMethod::Get, payload).await
    }

    /// POST to a URL
    pub async fn post(&mut self, url: &str, payload: Payload) -> Result<String> {
        self.fetch(url, HttpMethod::Post, payload).await
    }

    /// Fetch a document.
    ///
    /// A history entry is appended as soon as a response arrives, error
    /// statuses included; 4xx/5xx responses are then returned as
    /// [`BrowseError::HttpStatus`]. Transport failures append nothing.
    pub async fn fetch(&mut self, url: &str, method: HttpMethod, payload: Payload) -> Result<String> {
        self.execute(url, method, payload, None).await
    }

    /// Like [`fetch`](Self::fetch), but gives up with
    /// [`BrowseError::Timeout`] once `deadline` passes.
    pub async fn fetch_before(
        &mut self,
        deadline: Instant,
        url: &str,
        method: HttpMethod,
        payload: Payload,
    ) -> Result<String> {
        self.execute(url, method, payload, Some(deadline)).await
    }

    async fn execute(
        &mut self,
        url: &str,
        method: HttpMethod,
        payload: Payload,
        deadline: Option<Instant>,
    ) -> Result<String> {
        let target = Url::parse(url).map_err(|e| BrowseError::invalid_url(url, e))?;
        let client = self.connect()?.clone();

        let request = match method {
            HttpMethod::Get => client.get(target),
            HttpMethod::Post => client.post(target),
        };
        let request = match payload {
            Payload::None => request,
            Payload::Query(params) => request.query(&params),
            Payload::Form(fields) => request.form(&fields),
            Payload::Json(body) => request.json(&body),
        };

        tracing::debug!(%method, url, "navigating");

        let sent = match deadline {
            Some(deadline) => timeout_at(deadline, request.send())
                .await
                .map_err(|_| deadline_elapsed(url))?,
            None => request.send().await,
        };
        let response = sent.map_err(|e| {
            let err = BrowseError::from_transport(url, e);
            tracing::debug!(url, error = %err, "no response");
            err
        })?;

        let status = response.status();
        self.history.push(NavigationHistoryEntry {
            url: url.to_string(),
            method,
            status: status.as_u16(),
            timestamp: Utc::now(),
        });
        tracing::debug!(url, status = status.as_u16(), "response received");

        if status.is_client_error() || status.is_server_error() {
            return Err(status_error(status, url));
        }

        let body = match deadline {
            Some(deadline) => timeout_at(deadline, response.text())
                .await
                .map_err(|_| deadline_elapsed(url))?,
            None => response.text().await,
        };
        body.map_err(|e| BrowseError::from_transport(url, e))
    }

    /// Resolve `relative` against `base` using standard URL rules
    pub fn resolve(base: &str, relative: &str) -> Result<String> {
        let base_url = Url::parse(base).map_err(|e| BrowseError::invalid_url(base, e))?;
        base_url
            .join(relative)
            .map(String::from)
            .map_err(|e| BrowseError::invalid_url(relative, e))
    }

    /// Every response received so far, oldest first
    pub fn history(&self) -> &[NavigationHistoryEntry] {
        &self.history
    }

    /// URL of the most recent response
    pub fn current_url(&self) -> Option<&str> {
        self.history.last().map(|entry| entry.url.as_str())
    }

    /// Release the network session. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("closed navigation session");
        }
    }
}

fn status_error(status: StatusCode, url: &str) -> BrowseError {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    BrowseError::http_status(status.as_u16(), format!("{} for {}", reason, url))
}

fn deadline_elapsed(url: &str) -> BrowseError {
    BrowseError::timeout(format!("deadline elapsed awaiting response from {}", url))
}
