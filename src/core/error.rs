//! Custom error types for deepbrowse
//!
//! Provides a unified error handling system across all modules.
//! Navigation failures are split into the three transport outcomes
//! (no response, error status, deadline) so callers can tell them apart.

use thiserror::Error;

/// Main error type for deepbrowse operations
#[derive(Error, Debug)]
pub enum BrowseError {
    /// No response was obtained (DNS, connect, TLS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived with a 4xx/5xx status
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The deadline elapsed while awaiting a response
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Anything else that escaped a browsing session
    #[error("Error during browsing session: {0}")]
    Orchestration(String),

    /// Ollama connection or API errors
    #[error("Ollama error: {0}")]
    Ollama(String),

    /// Ollama not reachable
    #[error("Ollama is not reachable at {0}. Start it with `ollama serve` and pull '{1}'")]
    OllamaNotReachable(String, String),

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A URL could not be parsed or resolved
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for deepbrowse operations
pub type Result<T> = std::result::Result<T, BrowseError>;

impl BrowseError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an orchestration error
    pub fn orchestration(msg: impl Into<String>) -> Self {
        Self::Orchestration(msg.into())
    }

    /// Create an Ollama error
    pub fn ollama(msg: impl Into<String>) -> Self {
        Self::Ollama(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify a transport failure from reqwest.
    ///
    /// Status errors never reach this path: the navigation client checks the
    /// status itself after recording the response.
    pub fn from_transport(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(format!("request to {} timed out", url))
        } else {
            Self::network(format!("Error fetching {}: {}", url, error))
        }
    }

    /// Whether this error came from the transport layer
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::HttpStatus { .. } | Self::Timeout(_)
        )
    }

    /// Status code carried by an HTTP status error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = BrowseError::http_status(404, "Not Found for https://example.com/missing");
        assert_eq!(
            err.to_string(),
            "HTTP 404: Not Found for https://example.com/missing"
        );
        assert_eq!(err.status(), Some(404));
        assert!(err.is_navigation());
    }

    #[test]
    fn test_orchestration_is_not_navigation() {
        let err = BrowseError::orchestration("oracle failed");
        assert!(!err.is_navigation());
        assert!(err.to_string().contains("oracle failed"));
    }
}
