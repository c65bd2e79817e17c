//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction and the Ollama client that backs the
//! default decision oracle.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
