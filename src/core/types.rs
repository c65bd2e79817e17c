//! Shared types used across deepbrowse modules
//!
//! Contains the browsing data model (visits, history entries, collected
//! data, page metadata) and the oracle vocabulary (messages, tool calls,
//! tool definitions).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP method used for a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Transport-level record kept by the navigation client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationHistoryEntry {
    pub url: String,
    pub method: HttpMethod,
    /// Status code of the response, error statuses included
    pub status: u16,
    pub timestamp: DateTime<Utc>,
}

/// A page visited during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVisit {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub http_status: u16,
}

/// Metadata probed from a page's meta tags.
///
/// Every field is an empty string when the page does not provide it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub published_date: String,
    pub image: String,
    pub canonical_url: String,
    pub og_title: String,
    pub og_description: String,
}

/// An anchor extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Where a collected datum came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Distilled from a visited document
    Page,
    /// Produced by the decision oracle
    Agent,
}

/// One piece of evidence accumulated during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedDatum {
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub metadata: PageMetadata,
    pub provenance: Provenance,
}

impl CollectedDatum {
    /// Evidence distilled from a page
    pub fn from_page(
        source_url: impl Into<String>,
        content: impl Into<String>,
        metadata: PageMetadata,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            title: metadata.title.clone(),
            content: content.into(),
            metadata,
            provenance: Provenance::Page,
        }
    }

    /// Evidence produced by the oracle
    pub fn from_agent(title: impl Into<String>, content: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            source_url: "agent_result".to_string(),
            metadata: PageMetadata {
                title: title.clone(),
                ..PageMetadata::default()
            },
            title,
            content: content.into(),
            provenance: Provenance::Agent,
        }
    }
}

/// A message in an oracle conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
    /// Optional tool calls made by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            tool_calls: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            tool_calls: None,
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            tool_calls: None,
        }
    }
}

/// A tool invocation requested by the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Definition of a tool offered to the oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Result of executing a tool.
///
/// Failures still carry text: the oracle reads tool output as plain text,
/// so a failed call is reported as an `Error: ...` payload.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub tool_name: String,
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: format!("Error: {}", error),
        }
    }
}

/// Category of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Tools that issue network requests
    Navigation,
    /// Tools that only transform text already in hand
    Extraction,
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolCategory::Navigation => write!(f, "navigation"),
            ToolCategory::Extraction => write!(f, "extraction"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Post).unwrap();
        assert_eq!(json, "\"POST\"");
        assert_eq!(HttpMethod::Get.to_string(), "GET");
    }

    #[test]
    fn test_metadata_defaults_to_empty_strings() {
        let meta = PageMetadata::default();
        let value = serde_json::to_value(&meta).unwrap();
        for (_, field) in value.as_object().unwrap() {
            assert_eq!(field, "");
        }
    }

    #[test]
    fn test_agent_datum() {
        let datum = CollectedDatum::from_agent("Agent Results", "42");
        assert_eq!(datum.source_url, "agent_result");
        assert_eq!(datum.provenance, Provenance::Agent);
        assert_eq!(datum.metadata.title, "Agent Results");
    }

    #[test]
    fn test_tool_failure_is_prefixed() {
        let result = ToolResult::failure("browse", "connection refused");
        assert!(!result.success);
        assert_eq!(result.output, "Error: connection refused");
    }
}
