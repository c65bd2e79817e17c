//! Decision oracles
//!
//! A session is driven either by an oracle that picks tools, or by the
//! fixed fallback plan. The choice is made once, when the session starts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::loop_state::{format_observations, Observation};
use crate::agent::plan::LinkSelector;
use crate::core::{BrowseError, Config, Message, Result, ToolCall, ToolDefinition};
use crate::llm::{GenerateOptions, LLMProvider, OllamaClient};

/// What the oracle wants to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Invoke(ToolCall),
    Final(String),
}

/// Chooses the next action from the prompt, the tool surface, and what
/// the tools have returned so far.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(
        &self,
        prompt: &str,
        tools: &[ToolDefinition],
        observations: &[Observation],
    ) -> Result<Decision>;

    fn name(&self) -> &str;
}

/// How a session picks its actions
#[derive(Clone)]
pub enum Strategy {
    Oracle(Arc<dyn DecisionOracle>),
    Fallback(Arc<dyn LinkSelector>),
}

impl Strategy {
    pub fn name(&self) -> &str {
        match self {
            Strategy::Oracle(oracle) => oracle.name(),
            Strategy::Fallback(_) => "fallback",
        }
    }

    pub fn is_oracle(&self) -> bool {
        matches!(self, Strategy::Oracle(_))
    }
}

const SYSTEM_PROMPT: &str = r#"You are a web research agent. Answer the user's question by browsing the web with the tools provided.

## Tools
- `search`: search the web. Returns a list of result links.
- `browse`: open a URL. Returns a condensed view of the page.
- `extract_content`: shorten HTML you already have.
- `extract_links`: list the absolute links in HTML you already have.

## Rules
- Call one tool at a time and read the latest observation before the next call.
- Only browse URLs that appeared in an observation.
- When you have enough information, reply with the final answer and no tool call."#;

/// Oracle backed by an LLM with tool calling
pub struct LlmOracle {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl LlmOracle {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Oracle on the configured Ollama server and model
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(OllamaClient::from_config(config)),
            config.oracle.model.clone(),
        )
    }

    /// Connect to Ollama and make sure the configured model is installed
    pub async fn probe(config: &Config) -> Result<Self> {
        let oracle = Self::from_config(config);

        let models = oracle.provider.list_models().await.map_err(|e| {
            tracing::debug!(error = %e, "ollama probe failed");
            BrowseError::OllamaNotReachable(config.ollama_url(), config.oracle.model.clone())
        })?;
        tracing::debug!(?models, "ollama models");

        if !oracle.provider.is_model_available(&config.oracle.model).await? {
            return Err(BrowseError::ModelNotFound(config.oracle.model.clone()));
        }

        Ok(oracle)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages(prompt: &str, observations: &[Observation]) -> Vec<Message> {
        let user_content = if observations.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\n{}", prompt, format_observations(observations))
        };
        vec![Message::system(SYSTEM_PROMPT), Message::user(user_content)]
    }
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    async fn decide(
        &self,
        prompt: &str,
        tools: &[ToolDefinition],
        observations: &[Observation],
    ) -> Result<Decision> {
        let response = self
            .provider
            .chat_with_tools(
                &self.model,
                &Self::messages(prompt, observations),
                tools,
                Some(GenerateOptions {
                    temperature: Some(0.1),
                    ..Default::default()
                }),
            )
            .await?;

        let mut calls = response.tool_calls.into_iter();
        match calls.next() {
            Some(call) => {
                if calls.len() > 0 {
                    tracing::debug!(skipped = calls.len(), "oracle proposed several tool calls, using the first");
                }
                Ok(Decision::Invoke(call))
            }
            None if response.content.trim().is_empty() => Err(BrowseError::ollama(
                "model returned neither a tool call nor an answer",
            )),
            None => Ok(Decision::Final(response.content)),
        }
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMResponse;
    use std::sync::Mutex;

    /// Provider that replays canned responses
    struct Canned {
        responses: Mutex<Vec<LLMResponse>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Canned {
        fn new(mut responses: Vec<LLMResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    fn response(content: &str, tool_calls: Vec<ToolCall>) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            tool_calls,
            usage: None,
            model: "test".to_string(),
        }
    }

    #[async_trait]
    impl LLMProvider for Canned {
        async fn chat_with_tools(
            &self,
            _model: &str,
            messages: &[Message],
            _tools: &[ToolDefinition],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BrowseError::ollama("no more responses"))
        }

        async fn is_model_available(&self, _model: &str) -> Result<bool> {
            Ok(true)
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec!["test".to_string()])
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_first_tool_call_wins() {
        let provider = Arc::new(Canned::new(vec![response(
            "",
            vec![
                ToolCall::new("search", serde_json::json!({"query": "a"})),
                ToolCall::new("browse", serde_json::json!({"url": "https://b"})),
            ],
        )]));
        let oracle = LlmOracle::new(provider, "test");

        let decision = oracle.decide("q", &[], &[]).await.unwrap();
        assert_eq!(
            decision,
            Decision::Invoke(ToolCall::new("search", serde_json::json!({"query": "a"})))
        );
    }

    #[tokio::test]
    async fn test_final_answer_and_observations_in_prompt() {
        let provider = Arc::new(Canned::new(vec![response("The battery lasts 23 hours.", vec![])]));
        let oracle = LlmOracle::new(provider.clone(), "test");
        let observations = vec![Observation {
            tool_name: "browse".to_string(),
            success: true,
            output: "<p>Up to 23 hours</p>".to_string(),
        }];

        let decision = oracle.decide("battery?", &[], &observations).await.unwrap();
        assert_eq!(decision, Decision::Final("The battery lasts 23 hours.".to_string()));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, "system");
        assert!(seen[0][1].content.starts_with("battery?"));
        assert!(seen[0][1].content.contains("Up to 23 hours"));
    }

    #[tokio::test]
    async fn test_empty_response_is_an_error() {
        let oracle = LlmOracle::new(Arc::new(Canned::new(vec![response("  ", vec![])])), "test");
        assert!(oracle.decide("q", &[], &[]).await.is_err());
        assert_eq!(oracle.name(), "canned");
    }
}
