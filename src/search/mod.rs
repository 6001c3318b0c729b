//! Content search over an Igloo community
//!
//! `search` builds a [`SearchRequest`] from tool arguments, collects pages
//! through the client and renders the records with the result formatter.

pub mod pagination;
pub mod request;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::client::IglooClient;
use crate::core::{Tool, ToolArgs, ToolError, ToolResult};
use crate::format::format_search_results;
pub use pagination::{paginate, PageSource, SearchOutcome, SearchResultPage};
pub use request::{ApplicationType, DateFilter, RelativeWindow, SearchError, SearchRequest};

/// Records returned when the caller gives no limit
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

impl From<SearchError> for ToolError {
    fn from(err: SearchError) -> Self {
        ToolError::InvalidArgs {
            message: err.to_string(),
        }
    }
}

/// Tool for searching community content
pub struct SearchTool {
    name: String,
    client: Arc<IglooClient>,
}

impl SearchTool {
    pub fn new(client: Arc<IglooClient>) -> Self {
        Self {
            name: "search".to_string(),
            client,
        }
    }

    /// `--limit=all` lifts the limit; absent means the default
    fn parse_limit(args: &ToolArgs) -> Result<Option<usize>, ToolError> {
        match args.get_named_arg("limit").map(|l| l.trim()) {
            Some(raw) if raw.eq_ignore_ascii_case("all") || raw.eq_ignore_ascii_case("none") => {
                Ok(None)
            }
            _ => Ok(Some(
                args.parse_named::<usize>("limit")?
                    .unwrap_or(DEFAULT_SEARCH_LIMIT),
            )),
        }
    }

    /// Translate tool arguments into a search request
    pub fn build_request(args: &ToolArgs) -> Result<SearchRequest, ToolError> {
        let query = args
            .get_named_arg("query")
            .cloned()
            .or_else(|| (!args.is_empty()).then(|| args.args.join(" ")));

        let applications = match args.get_named_arg("applications") {
            Some(raw) => ApplicationType::parse_list(raw)?,
            None => Vec::new(),
        };

        let date_filter = DateFilter::parse(
            args.get_named_arg("updated_date_type").map(String::as_str),
            args.get_named_arg("updated_date_range_from")
                .map(String::as_str),
            args.get_named_arg("updated_date_range_to").map(String::as_str),
        )?;

        let mut request = SearchRequest::new()
            .with_applications(applications)
            .with_search_all(args.flag("search_all", true)?)
            .with_include_microblog(args.flag("include_microblog", true)?)
            .with_include_archived(args.flag("include_archived", false)?)
            .with_date_filter(date_filter)
            .with_limit(Self::parse_limit(args)?);

        if let Some(query) = query {
            request = request.with_query(query);
        }
        if let Some(parent) = args.get_named_arg("parent_href") {
            request = request.with_parent_href(parent.clone());
        }
        if let Some(page_size) = args.parse_named::<usize>("page_size")? {
            if page_size == 0 {
                return Err(ToolError::InvalidArgs {
                    message: "page_size must be greater than 0".to_string(),
                });
            }
            request = request.with_page_size(page_size);
        }

        Ok(request)
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Searches community content (wikis, blogs, forums, documents, ...) and returns \
         matching items with their URLs. Use fetch on a URL to read the full page"
    }

    fn signature(&self) -> &str {
        "search [<query>] [--query=TEXT] [--applications=wiki,blog] [--parent_href=PATH] \
         [--updated_date_type=past_week|custom_range] [--updated_date_range_from=YYYY-MM-DD] \
         [--updated_date_range_to=YYYY-MM-DD] [--include_archived] [--limit=N|all]"
    }

    fn validate_args(&self, args: &ToolArgs) -> Result<(), ToolError> {
        Self::build_request(args).map(|_| ())
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let request = Self::build_request(args)?;
        let outcome = self.client.search(&request).await?;

        info!(
            query = request.query.as_deref().unwrap_or(""),
            returned = outcome.results.len(),
            total_found = outcome.total_found,
            "search completed"
        );

        let message = format_search_results(&outcome.results, &request, outcome.total_found);
        Ok(ToolResult::success_with_data(
            message,
            serde_json::json!({
                "returned": outcome.results.len(),
                "total_found": outcome.total_found,
            }),
        ))
    }

    fn get_parameters_schema(&self) -> serde_json::Value {
        let applications: Vec<&str> = ApplicationType::ALL.iter().map(|a| a.name()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search text; omit to list content matching the other filters"
                },
                "applications": {
                    "type": "array",
                    "items": { "type": "string", "enum": applications },
                    "description": "Restrict results to these application types"
                },
                "parent_href": {
                    "type": "string",
                    "description": "Only return content below this path, e.g. /spaces/engineering"
                },
                "updated_date_type": {
                    "type": "string",
                    "enum": ["past_hour", "past_24_hours", "past_week", "past_month", "past_year", "custom_range"],
                    "description": "Filter by last update time"
                },
                "updated_date_range_from": {
                    "type": "string",
                    "description": "Start date (YYYY-MM-DD), required with custom_range"
                },
                "updated_date_range_to": {
                    "type": "string",
                    "description": "End date (YYYY-MM-DD), required with custom_range"
                },
                "search_all": {
                    "type": "boolean",
                    "default": true
                },
                "include_microblog": {
                    "type": "boolean",
                    "default": true
                },
                "include_archived": {
                    "type": "boolean",
                    "default": false
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results",
                    "default": DEFAULT_SEARCH_LIMIT
                }
            },
            "required": []
        })
    }
}
