//! Agent orchestrator
//!
//! The public entry point: owns the navigation client across questions,
//! picks the session strategy, and keeps the last result for summary queries.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::oracle::{DecisionOracle, LlmOracle, Strategy};
use crate::agent::plan::{FirstUnvisited, LinkSelector};
use crate::agent::session::{run_session, BrowseResult};
use crate::agent::summary::{build_summary, NO_DATA_SUMMARY};
use crate::core::{Config, NavigationHistoryEntry, Result};
use crate::navigation::NavigationClient;

/// Autonomous browsing agent
pub struct Agent {
    /// Configuration
    config: Config,
    /// Navigation client shared by every session of this agent
    client: NavigationClient,
    /// Oracle used while `config.oracle.enabled` is set
    oracle: Option<Arc<dyn DecisionOracle>>,
    /// Whether the oracle was supplied by the caller rather than probed
    oracle_injected: bool,
    /// Link follower for fallback sessions
    selector: Arc<dyn LinkSelector>,
    last_result: Option<BrowseResult>,
}

impl Agent {
    /// Create a new agent with the loaded configuration
    pub fn new() -> Self {
        Self::with_config(Config::load())
    }

    /// Create an agent with custom configuration
    pub fn with_config(config: Config) -> Self {
        let client = NavigationClient::new(config.http.clone());
        Self {
            config,
            client,
            oracle: None,
            oracle_injected: false,
            selector: Arc::new(FirstUnvisited),
            last_result: None,
        }
    }

    /// Use `oracle` for every session instead of probing Ollama
    pub fn with_oracle(mut self, oracle: Arc<dyn DecisionOracle>) -> Self {
        self.oracle = Some(oracle);
        self.oracle_injected = true;
        self
    }

    /// Replace the fallback link follower
    pub fn with_link_selector(mut self, selector: Arc<dyn LinkSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Open the network session and, when enabled and none was injected,
    /// look for an Ollama oracle. An unreachable Ollama is not an error:
    /// sessions then use the fallback plan.
    pub async fn initialize(&mut self) -> Result<()> {
        self.client.connect()?;

        if !self.config.oracle.enabled || self.oracle_injected {
            return Ok(());
        }

        match LlmOracle::probe(&self.config).await {
            Ok(oracle) => {
                tracing::info!(model = oracle.model(), "decision oracle ready");
                self.oracle = Some(Arc::new(oracle));
            }
            Err(e) => {
                tracing::warn!(error = %e, "decision oracle unavailable, using the fallback plan");
                self.oracle = None;
            }
        }
        Ok(())
    }

    /// Strategy the next session will use
    pub fn strategy(&self) -> Strategy {
        match &self.oracle {
            Some(oracle) if self.config.oracle.enabled => Strategy::Oracle(Arc::clone(oracle)),
            _ => Strategy::Fallback(Arc::clone(&self.selector)),
        }
    }

    /// Browse the web for `prompt` within `time_limit`.
    ///
    /// Never fails: inspect [`BrowseResult::error`] and
    /// [`BrowseResult::completed`].
    pub async fn ask(&mut self, prompt: &str, time_limit: Duration) -> BrowseResult {
        let strategy = self.strategy();
        let mut result = run_session(&strategy, &mut self.client, &self.config, prompt, time_limit).await;

        result.summary = Some(build_summary(prompt, &result.data_collected));
        self.last_result = Some(result.clone());
        result
    }

    /// [`ask`](Self::ask) with the configured time limit
    pub async fn ask_default(&mut self, prompt: &str) -> BrowseResult {
        let time_limit = self.config.time_limit();
        self.ask(prompt, time_limit).await
    }

    /// Summary of the last session
    pub fn get_summary(&self) -> String {
        self.last_result
            .as_ref()
            .and_then(|result| result.summary.clone())
            .unwrap_or_else(|| NO_DATA_SUMMARY.to_string())
    }

    /// Result of the last session
    pub fn last_result(&self) -> Option<&BrowseResult> {
        self.last_result.as_ref()
    }

    /// Every response the navigation client received, across sessions
    pub fn navigation_history(&self) -> &[NavigationHistoryEntry] {
        self.client.history()
    }

    /// Release the network session. Safe to call more than once.
    pub fn close(&mut self) {
        self.client.close();
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the oracle model; a probed oracle is dropped until the next
    /// [`initialize`](Self::initialize).
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.oracle.model = model.into();
        if !self.oracle_injected {
            self.oracle = None;
        }
    }

    /// Enable or disable the oracle for later sessions
    pub fn set_oracle_enabled(&mut self, enabled: bool) {
        self.config.oracle.enabled = enabled;
    }

    /// Default time limit for [`ask_default`](Self::ask_default)
    pub fn set_time_limit(&mut self, time_limit: Duration) {
        self.config.session.time_limit_secs = time_limit.as_secs();
    }

    /// Enable debug mode
    pub fn set_debug(&mut self, debug: bool) {
        self.config.agent.debug = debug;
    }

    /// Name of the oracle the next session will use, if any
    pub fn oracle_name(&self) -> Option<&str> {
        match &self.oracle {
            Some(oracle) if self.config.oracle.enabled => Some(oracle.name()),
            _ => None,
        }
    }

    /// Save current configuration to file
    pub fn save_config(&self) -> Result<std::path::PathBuf> {
        self.config.save()
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> Config {
        let mut config = Config::default();
        config.oracle.enabled = false;
        config.session.search_url = "http://127.0.0.1:1/search?q=".to_string();
        config.session.step_delay_ms = 0;
        config
    }

    #[test]
    fn test_summary_before_any_ask() {
        let agent = Agent::with_config(offline_config());
        assert_eq!(agent.get_summary(), NO_DATA_SUMMARY);
        assert!(agent.last_result().is_none());
        assert!(!agent.strategy().is_oracle());
    }

    #[tokio::test]
    async fn test_initialize_without_oracle() {
        let mut agent = Agent::with_config(offline_config());
        agent.initialize().await.unwrap();
        assert!(agent.oracle_name().is_none());
        agent.close();
        agent.close();
    }

    #[tokio::test]
    async fn test_failed_ask_still_summarizes() {
        let mut agent = Agent::with_config(offline_config());
        let result = agent.ask("rust", Duration::from_secs(5)).await;

        assert!(!result.completed);
        assert!(result.error.is_some());
        assert_eq!(result.summary.as_deref(), Some(NO_DATA_SUMMARY));
        assert_eq!(agent.get_summary(), NO_DATA_SUMMARY);
        assert!(agent.last_result().is_some());
    }

    #[test]
    fn test_setters() {
        let mut agent = Agent::with_config(offline_config());
        agent.set_time_limit(Duration::from_secs(42));
        agent.set_model("llama3.2");
        agent.set_oracle_enabled(true);
        assert_eq!(agent.config().time_limit(), Duration::from_secs(42));
        assert_eq!(agent.config().oracle.model, "llama3.2");
        assert!(agent.config().oracle.enabled);
        assert!(!agent.strategy().is_oracle());
    }
}
