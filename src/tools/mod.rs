//! Tools module - Tool implementations for the decision oracle
//!
//! Contains the web tools (search, browse, extraction) and the tool registry.

pub mod registry;
pub mod web;

pub use registry::ToolRegistry;
pub use web::WebTools;
