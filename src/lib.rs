//! deepbrowse - Autonomous Web Browsing Agent
//!
//! Ask a question, let the agent browse the web within a time budget, and
//! get back the pages it visited, the text it collected, and a summary.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Navigation**: Browser-like HTTP client with visit history
//! - **Distill**: HTML to title, metadata, main content, links, or a condensed digest
//! - **Tools**: Web tools exposed to the decision oracle
//! - **LLM**: LLM provider abstraction with Ollama implementation
//! - **Agent**: Session engine, decision strategies, and summaries
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use deepbrowse::agent::Agent;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut agent = Agent::new();
//!     agent.initialize().await.unwrap();
//!
//!     let result = agent.ask("iPhone 15 Pro battery life", Duration::from_secs(60)).await;
//!     println!("{}", agent.get_summary());
//!     assert_eq!(result.summary.as_deref(), Some(agent.get_summary().as_str()));
//!     agent.close();
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod distill;
pub mod llm;
pub mod navigation;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, BrowseResult};
pub use cli::{render_result, Repl};
pub use core::{BrowseError, Config, Result};
