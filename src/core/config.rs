//! Configuration management for deepbrowse
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/deepbrowse/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{BrowseError, Result};

/// Desktop Chrome user agent; some sites refuse non-browser clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Search endpoint; the URL-encoded query is appended.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Main configuration for deepbrowse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Navigation client configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Browsing session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Content distillation budgets
    #[serde(default)]
    pub distill: DistillConfig,
    /// Decision oracle configuration
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Agent behavior configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Navigation client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Accept-Language header
    pub accept_language: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Browsing session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default wall-clock budget for `ask` in seconds
    pub time_limit_secs: u64,
    /// Pause between fallback iterations in milliseconds
    pub step_delay_ms: u64,
    /// Pages the fallback plan visits before it is complete
    pub min_pages: usize,
    /// Search URL prefix
    pub search_url: String,
}

/// Content distillation budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistillConfig {
    /// Character budget for condensed pages returned by `browse`
    pub condensed_budget: usize,
    /// Character budget for `extract_content`
    pub content_budget: usize,
    /// Maximum links returned by `extract_links`
    pub max_links: usize,
}

/// Decision oracle (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Whether to try the Ollama-backed oracle at all
    pub enabled: bool,
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Model used for tool selection
    pub model: String,
    /// Maximum oracle turns per session
    pub max_turns: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Whether to show debug output
    pub debug: bool,
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: env::var("DEEPBROWSE_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            accept_language: "en-US,en;q=0.5".to_string(),
            timeout_secs: env::var("DEEPBROWSE_HTTP_TIMEOUT")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: env::var("DEEPBROWSE_TIME_LIMIT")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(180),
            step_delay_ms: 1000,
            min_pages: 3,
            search_url: env::var("DEEPBROWSE_SEARCH_URL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_URL.to_string()),
        }
    }
}

impl Default for DistillConfig {
    fn default() -> Self {
        Self {
            condensed_budget: 8000,
            content_budget: 8000,
            max_links: 10,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: env_flag("DEEPBROWSE_ORACLE", true),
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            model: env::var("DEEPBROWSE_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            max_turns: 10,
            timeout_secs: 120,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            debug: env_flag("DEEPBROWSE_DEBUG", false),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deepbrowse")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(BrowseError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| BrowseError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing sections use defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BrowseError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file and return the path
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| BrowseError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BrowseError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| BrowseError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.oracle.host, self.oracle.port)
    }

    /// Default session time limit
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.session.time_limit_secs)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.min_pages, 3);
        assert_eq!(config.session.step_delay_ms, 1000);
        assert_eq!(config.distill.content_budget, 8000);
        assert_eq!(config.distill.max_links, 10);
        assert_eq!(config.oracle.max_turns, 10);
        assert!(config.http.user_agent.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [session]
            time_limit_secs = 15
            step_delay_ms = 10
            min_pages = 2
            search_url = "http://localhost:9000/search?q="
            "#,
        )
        .unwrap();
        assert_eq!(config.time_limit(), Duration::from_secs(15));
        assert_eq!(config.session.min_pages, 2);
        assert_eq!(config.distill.condensed_budget, 8000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("[session\n").unwrap_err();
        assert!(matches!(err, BrowseError::Config(_)));
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("search_url"));
        assert!(toml_str.contains("condensed_budget"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("deepbrowse"));
    }
}
