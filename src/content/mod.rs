//! Page fetching tools
//!
//! `fetch` downloads community pages, converts them to markdown and returns a
//! bounded character window. Long pages are read in several calls by passing
//! back the `start_index` printed at the end of each partial window.

pub mod convert;
pub mod window;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::client::IglooClient;
use crate::core::{Tool, ToolArgs, ToolError, ToolResult};
use crate::format::{
    format_fetch_result, format_fetch_results, format_truncation_metadata, FetchedPage,
};
pub use convert::{html_to_markdown, to_document};
pub use window::{percent_complete, window, FetchableDocument, TruncationWindow, WindowStatus};

/// Render one window: content followed by the continuation footer if partial
fn render_window(
    url: &str,
    document: &FetchableDocument,
    start_index: usize,
    max_chars: usize,
) -> (String, TruncationWindow) {
    let (text, win) = window(document, start_index, max_chars);
    let mut rendered = text.to_string();
    if win.is_partial() {
        rendered.push_str(&format_truncation_metadata(&win, url));
    }
    (rendered, win)
}

/// Tool for reading one or more community pages
pub struct FetchTool {
    name: String,
    client: Arc<IglooClient>,
    max_chars: usize,
}

impl FetchTool {
    pub fn new(client: Arc<IglooClient>, max_chars: usize) -> Self {
        Self {
            name: "fetch".to_string(),
            client,
            max_chars: max_chars.max(1),
        }
    }

    fn urls(args: &ToolArgs) -> Vec<String> {
        let mut urls: Vec<String> = args.args.iter().map(|u| u.trim().to_string()).collect();
        if let Some(named) = args.get_named_arg("url") {
            urls.extend(named.split_whitespace().map(str::to_string));
        }
        urls.retain(|u| !u.is_empty());
        urls
    }

    async fn fetch_single(
        &self,
        url: &str,
        start_index: usize,
        max_chars: usize,
    ) -> Result<ToolResult> {
        let html = self.client.fetch_page(url).await?;
        let document = to_document(&html);
        let (body, win) = render_window(url, &document, start_index, max_chars);

        info!(
            url,
            start_index,
            chars_returned = win.chars_returned,
            chars_total = win.chars_total,
            status = win.status.as_str(),
            "fetched page window"
        );

        let message = format_fetch_result(url, &body, Some(start_index));
        Ok(ToolResult::success_with_data(
            message,
            serde_json::json!({
                "url": url,
                "start_index": start_index,
                "window": win,
            }),
        ))
    }

    async fn fetch_many(&self, urls: &[String], max_chars: usize) -> Result<ToolResult> {
        let outcomes = self.client.fetch_pages(urls).await;

        let mut pages = Vec::with_capacity(urls.len());
        let mut windows = Vec::with_capacity(urls.len());
        for (url, outcome) in urls.iter().zip(outcomes) {
            match outcome {
                Ok(html) => {
                    let (markdown, win) = render_window(url, &to_document(&html), 0, max_chars);
                    windows.push(serde_json::json!({ "url": url, "window": win }));
                    pages.push(FetchedPage {
                        url: url.clone(),
                        markdown,
                        error: None,
                    });
                }
                Err(e) => {
                    windows.push(serde_json::json!({ "url": url, "error": e.to_string() }));
                    pages.push(FetchedPage {
                        url: url.clone(),
                        markdown: String::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let failed = pages.iter().filter(|p| p.error.is_some()).count();
        info!(pages = pages.len(), failed, "fetched multiple pages");

        Ok(ToolResult::success_with_data(
            format_fetch_results(&pages, urls.len()),
            serde_json::json!({ "pages": windows, "failed": failed }),
        ))
    }
}

#[async_trait]
impl Tool for FetchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Fetches one or more community pages and returns their content as markdown. \
         Long pages are truncated; continue reading with the start_index given at the end of the output"
    }

    fn signature(&self) -> &str {
        "fetch <url> [<url> ...] [--start_index=N] [--max_chars=N]"
    }

    fn validate_args(&self, args: &ToolArgs) -> Result<(), ToolError> {
        let urls = Self::urls(args);
        if urls.is_empty() {
            return Err(ToolError::InvalidArgs {
                message: "Usage: fetch <url> [<url> ...] [--start_index=N] [--max_chars=N]"
                    .to_string(),
            });
        }
        let start_index = args.parse_named::<usize>("start_index")?.unwrap_or(0);
        if start_index > 0 && urls.len() > 1 {
            return Err(ToolError::InvalidArgs {
                message: "start_index can only be used when fetching a single URL".to_string(),
            });
        }
        if args.parse_named::<usize>("max_chars")? == Some(0) {
            return Err(ToolError::InvalidArgs {
                message: "max_chars must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let urls = Self::urls(args);
        let start_index = args.parse_named::<usize>("start_index")?.unwrap_or(0);
        let max_chars = args
            .parse_named::<usize>("max_chars")?
            .unwrap_or(self.max_chars);

        match urls.as_slice() {
            [url] => self.fetch_single(url, start_index, max_chars).await,
            _ => self.fetch_many(&urls, max_chars).await,
        }
    }

    fn get_parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ],
                    "description": "Full URL of a community page, or a list of URLs to fetch concurrently"
                },
                "start_index": {
                    "type": "integer",
                    "description": "Character offset to continue reading from (single URL only)",
                    "default": 0
                },
                "max_chars": {
                    "type": "integer",
                    "description": "Maximum characters of page content to return",
                    "default": self.max_chars
                }
            },
            "required": ["url"]
        })
    }
}
