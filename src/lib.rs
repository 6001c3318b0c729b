//! # igloo-tools - LLM tools for Igloo communities
//!
//! Structured, LLM-friendly tools for searching and reading the content of an
//! Igloo digital workplace community.
//!
//! ## Features
//!
//! - **Search**: Content search with filters, bounded pagination with
//!   concurrent page fan-out
//! - **Fetch**: Page retrieval converted to markdown, with resumable
//!   character windows for long pages
//! - **Members**: Member directory search and profile lookup
//! - **LLM glue**: Function-call JSON conversion and batch execution
//!
//! ## Usage
//!
//! ```rust,no_run
//! use igloo_tools::{create_tool_registry, IglooClient, IglooConfig, ToolArgs};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = IglooConfig::load(None)?;
//! config.validate()?;
//! let client = Arc::new(IglooClient::from_config(&config)?);
//! client.authenticate().await?;
//!
//! let registry = create_tool_registry(client, &config);
//! let result = registry
//!     .execute_tool("search", &ToolArgs::from_args(&["--query=handbook"]))
//!     .await?;
//! println!("{}", result.message);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod content;
pub mod core;
pub mod format;
pub mod llm;
pub mod members;
pub mod search;

use std::sync::Arc;

// Re-export main types
pub use client::{IglooClient, IglooError};
pub use config::IglooConfig;
pub use content::FetchTool;
pub use crate::core::{Tool, ToolArgs, ToolError, ToolRegistry, ToolResult};
pub use members::{FetchMemberTool, SearchMembersTool};
pub use search::{SearchRequest, SearchTool};

/// Initialize the tool registry with every Igloo tool sharing one client
pub fn create_tool_registry(client: Arc<IglooClient>, config: &IglooConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Content tools
    registry.register(Box::new(SearchTool::new(Arc::clone(&client))));
    registry.register(Box::new(FetchTool::new(
        Arc::clone(&client),
        config.max_fetch_chars,
    )));

    // Member directory tools
    registry.register(Box::new(SearchMembersTool::new(Arc::clone(&client))));
    registry.register(Box::new(FetchMemberTool::new(client)));

    registry
}
