//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for the oracle-facing tool definitions and routing of tool
//! calls to the web tools.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::core::config::DistillConfig;
use crate::core::{ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::navigation::NavigationClient;
use crate::tools::web::WebTools;

pub const SEARCH: &str = "search";
pub const BROWSE: &str = "browse";
pub const EXTRACT_CONTENT: &str = "extract_content";
pub const EXTRACT_LINKS: &str = "extract_links";

/// Registry of available tools
pub struct ToolRegistry {
    /// Tool definitions in registration order
    definitions: Vec<ToolDefinition>,
    /// Tool categories
    categories: HashMap<String, ToolCategory>,
    web: WebTools,
}

impl ToolRegistry {
    /// Create a registry with the four web tools
    pub fn new(limits: DistillConfig, search_url: impl Into<String>) -> Self {
        let mut registry = Self {
            definitions: Vec::new(),
            categories: HashMap::new(),
            web: WebTools::new(limits, search_url),
        };
        registry.register_web_tools();
        registry
    }

    fn register_web_tools(&mut self) {
        self.register(
            ToolDefinition::function(
                SEARCH,
                "Search the web for pages related to a query. Returns the top results as an HTML list of links.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                }),
            ),
            ToolCategory::Navigation,
        );

        self.register(
            ToolDefinition::function(
                BROWSE,
                "Open a URL and return a condensed view of the page: title and leading paragraphs, result lists for search pages, or extracted specifications for product pages.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "Absolute URL to open"
                        }
                    },
                    "required": ["url"]
                }),
            ),
            ToolCategory::Navigation,
        );

        self.register(
            ToolDefinition::function(
                EXTRACT_CONTENT,
                "Return HTML content cut to a size that fits in context.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "html": {
                            "type": "string",
                            "description": "HTML to extract from"
                        }
                    },
                    "required": ["html"]
                }),
            ),
            ToolCategory::Extraction,
        );

        self.register(
            ToolDefinition::function(
                EXTRACT_LINKS,
                "List the absolute http(s) links found in HTML content (at most 10).",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "html": {
                            "type": "string",
                            "description": "HTML to scan for links"
                        }
                    },
                    "required": ["html"]
                }),
            ),
            ToolCategory::Extraction,
        );
    }

    /// Register a tool definition
    pub fn register(&mut self, definition: ToolDefinition, category: ToolCategory) {
        let name = definition.function.name.clone();
        self.definitions.retain(|existing| existing.name() != name);
        self.definitions.push(definition);
        self.categories.insert(name, category);
    }

    /// Get all tool definitions
    pub fn all_definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Get tool definitions by category
    pub fn definitions_by_category(&self, category: ToolCategory) -> Vec<&ToolDefinition> {
        self.definitions
            .iter()
            .filter(|def| self.categories.get(def.name()) == Some(&category))
            .collect()
    }

    /// Title recorded by a tool when it fetched `url`
    pub fn page_title(&self, url: &str) -> Option<&str> {
        self.web.title_for(url)
    }

    /// Execute a tool call.
    ///
    /// Never fails: unknown tools, missing arguments, and navigation errors
    /// all come back as an unsuccessful [`ToolResult`] with `Error: ...` text.
    pub async fn execute(
        &mut self,
        client: &mut NavigationClient,
        deadline: Instant,
        tool_call: &ToolCall,
    ) -> ToolResult {
        let name = tool_call.name.as_str();
        tracing::debug!(tool = name, arguments = %tool_call.arguments, "executing tool");

        match self.categories.get(name).copied() {
            Some(ToolCategory::Navigation) => self.execute_navigation_tool(client, deadline, tool_call).await,
            Some(ToolCategory::Extraction) => self.execute_extraction_tool(tool_call),
            None => ToolResult::failure(name, format!("Unknown tool: {}", name)),
        }
    }

    async fn execute_navigation_tool(
        &mut self,
        client: &mut NavigationClient,
        deadline: Instant,
        tool_call: &ToolCall,
    ) -> ToolResult {
        let name = tool_call.name.as_str();
        let outcome = match name {
            SEARCH => match tool_call.get_string("query") {
                Some(query) => self.web.search(client, deadline, &query).await,
                None => return missing_argument(name, "query"),
            },
            BROWSE => match tool_call.get_string("url") {
                Some(url) => self.web.browse(client, deadline, &url).await,
                None => return missing_argument(name, "url"),
            },
            _ => return ToolResult::failure(name, format!("Unknown navigation tool: {}", name)),
        };

        match outcome {
            Ok(output) => ToolResult::success(name, output),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool failed");
                ToolResult::failure(name, e)
            }
        }
    }

    fn execute_extraction_tool(&self, tool_call: &ToolCall) -> ToolResult {
        let name = tool_call.name.as_str();
        let Some(html) = tool_call.get_string("html") else {
            return missing_argument(name, "html");
        };

        match name {
            EXTRACT_CONTENT => ToolResult::success(name, self.web.extract_content(&html)),
            EXTRACT_LINKS => ToolResult::success(name, self.web.extract_links(&html).join("\n")),
            _ => ToolResult::failure(name, format!("Unknown extraction tool: {}", name)),
        }
    }
}

fn missing_argument(tool: &str, argument: &str) -> ToolResult {
    ToolResult::failure(tool, format!("missing required argument '{}'", argument))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HttpConfig;
    use std::time::Duration;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(DistillConfig::default(), "http://127.0.0.1:1/search?q=")
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_registers_four_tools_in_order() {
        let registry = registry();
        let names: Vec<_> = registry.all_definitions().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec![SEARCH, BROWSE, EXTRACT_CONTENT, EXTRACT_LINKS]);
        assert_eq!(registry.definitions_by_category(ToolCategory::Navigation).len(), 2);
        assert_eq!(registry.definitions_by_category(ToolCategory::Extraction).len(), 2);
    }

    #[test]
    fn test_reregistering_replaces_definition() {
        let mut registry = registry();
        registry.register(
            ToolDefinition::function(SEARCH, "replacement", serde_json::json!({})),
            ToolCategory::Navigation,
        );
        assert_eq!(registry.all_definitions().len(), 4);
        assert_eq!(registry.all_definitions()[3].function.description, "replacement");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_missing_argument() {
        let mut registry = registry();
        let mut client = NavigationClient::new(HttpConfig::default());

        let unknown = registry
            .execute(&mut client, deadline(), &ToolCall::new("click", serde_json::json!({})))
            .await;
        assert!(!unknown.success);
        assert_eq!(unknown.output, "Error: Unknown tool: click");

        let missing = registry
            .execute(&mut client, deadline(), &ToolCall::new(BROWSE, serde_json::json!({})))
            .await;
        assert!(!missing.success);
        assert!(missing.output.starts_with("Error: missing required argument 'url'"));
    }

    #[tokio::test]
    async fn test_navigation_failure_is_reported_as_text() {
        let mut registry = registry();
        let mut client = NavigationClient::new(HttpConfig::default());
        let result = registry
            .execute(
                &mut client,
                deadline(),
                &ToolCall::new(SEARCH, serde_json::json!({"query": "anything"})),
            )
            .await;
        assert!(!result.success);
        assert!(result.output.starts_with("Error: "));
        assert!(client.history().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_tools() {
        let mut registry = registry();
        let mut client = NavigationClient::new(HttpConfig::default());
        let html = r#"<a href="https://a.example.com/">a</a><a href="/b">b</a>"#;

        let links = registry
            .execute(
                &mut client,
                deadline(),
                &ToolCall::new(EXTRACT_LINKS, serde_json::json!({ "html": html })),
            )
            .await;
        assert!(links.success);
        assert_eq!(links.output, "https://a.example.com/");

        let content = registry
            .execute(
                &mut client,
                deadline(),
                &ToolCall::new(EXTRACT_CONTENT, serde_json::json!({ "html": html })),
            )
            .await;
        assert_eq!(content.output, html);
    }
}
