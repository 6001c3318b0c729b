//! Member directory tools

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::client::IglooClient;
use crate::core::{Tool, ToolArgs, ToolError, ToolResult};
use crate::format::{format_member_profile, format_member_search_results};

/// Members listed when the caller gives no limit
pub const DEFAULT_MEMBER_LIMIT: usize = 10;

/// Profile item naming the member's manager
const MANAGER_FIELD: &str = "i_report_to";

/// Tool for finding members by name
pub struct SearchMembersTool {
    name: String,
    client: Arc<IglooClient>,
}

impl SearchMembersTool {
    pub fn new(client: Arc<IglooClient>) -> Self {
        Self {
            name: "search_members".to_string(),
            client,
        }
    }

    fn query(args: &ToolArgs) -> Option<String> {
        args.get_named_arg("query")
            .cloned()
            .or_else(|| (!args.is_empty()).then(|| args.args.join(" ")))
            .filter(|q| !q.trim().is_empty())
    }
}

#[async_trait]
impl Tool for SearchMembersTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Searches the member directory by name and returns each member's name, email and ID"
    }

    fn signature(&self) -> &str {
        "search_members <query> [--limit=N]"
    }

    fn validate_args(&self, args: &ToolArgs) -> Result<(), ToolError> {
        if Self::query(args).is_none() {
            return Err(ToolError::InvalidArgs {
                message: "Usage: search_members <query> [--limit=N]".to_string(),
            });
        }
        args.parse_named::<usize>("limit")?;
        Ok(())
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let query = Self::query(args).unwrap_or_default();
        let limit = args
            .parse_named::<usize>("limit")?
            .unwrap_or(DEFAULT_MEMBER_LIMIT);

        let mut members = self.client.search_members(&query).await?;
        let found = members.len();
        members.truncate(limit);
        info!(query = %query, found, shown = members.len(), "member search completed");

        Ok(ToolResult::success_with_data(
            format_member_search_results(&members, &query),
            serde_json::json!({ "found": found, "returned": members.len() }),
        ))
    }

    fn get_parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Name or part of a name to search for"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of members to list",
                    "default": DEFAULT_MEMBER_LIMIT
                }
            },
            "required": ["query"]
        })
    }
}

/// Tool for reading one member's profile
pub struct FetchMemberTool {
    name: String,
    client: Arc<IglooClient>,
}

impl FetchMemberTool {
    pub fn new(client: Arc<IglooClient>) -> Self {
        Self {
            name: "fetch_member".to_string(),
            client,
        }
    }

    fn member_id(args: &ToolArgs) -> Option<String> {
        args.get_named_arg("member_id")
            .or_else(|| args.get_arg(0))
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    /// ID of the member's manager, if the profile names one
    fn manager_id(profile_items: &[Value]) -> Option<&str> {
        profile_items
            .iter()
            .find(|item| item.get("Name").and_then(Value::as_str) == Some(MANAGER_FIELD))
            .and_then(|item| item.get("Value"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "null")
    }
}

#[async_trait]
impl Tool for FetchMemberTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Fetches a member's profile (job title, department, manager, contact details) by member ID"
    }

    fn signature(&self) -> &str {
        "fetch_member <member_id>"
    }

    fn validate_args(&self, args: &ToolArgs) -> Result<(), ToolError> {
        match Self::member_id(args) {
            Some(_) => Ok(()),
            None => Err(ToolError::InvalidArgs {
                message: "Usage: fetch_member <member_id>".to_string(),
            }),
        }
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let member_id = Self::member_id(args).unwrap_or_default();

        let (member, profile_items) = futures::try_join!(
            self.client.get_member_info(&member_id),
            self.client.get_member_profile(&member_id)
        )?;

        let manager_name = match Self::manager_id(&profile_items) {
            Some(manager_id) => self.client.get_member_name(manager_id).await,
            None => None,
        };

        info!(member_id = %member_id, has_manager = manager_name.is_some(), "fetched member profile");

        Ok(ToolResult::success(format_member_profile(
            &member,
            &profile_items,
            manager_name.as_deref(),
            self.client.community(),
        )))
    }

    fn get_parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "member_id": {
                    "type": "string",
                    "description": "Member ID as listed by search_members"
                }
            },
            "required": ["member_id"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_config;
    use crate::client::transport::fake::FakeTransport;
    use crate::client::TransportError;
    use serde_json::json;

    fn directory() -> Arc<FakeTransport> {
        Arc::new(FakeTransport::new(|req| {
            let body = if req.url.ends_with("/search/members") {
                let hits: Vec<Value> = (1..=15)
                    .map(|i| json!({ "id": format!("u{}", i), "name": { "fullName": format!("Member {}", i) } }))
                    .collect();
                json!({ "response": { "value": { "hit": hits } } })
            } else if req.url.ends_with("/users/u1/view") {
                json!({ "response": {
                    "name": { "fullName": "Ada Lovelace" },
                    "email": "ada@example.com",
                    "namespace": "alovelace"
                } })
            } else if req.url.ends_with("/users/u1/viewprofile") {
                json!({ "response": { "items": [
                    { "Name": "title", "Value": "Engineer" },
                    { "Name": "i_report_to", "Value": "boss" }
                ] } })
            } else if req.url.ends_with("/users/u2/viewprofile") {
                json!({ "response": { "items": [
                    { "Name": "i_report_to", "Value": "gone" }
                ] } })
            } else if req.url.ends_with("/users/boss/view") {
                json!({ "response": { "name": { "fullName": "Charles Babbage" } } })
            } else if req.url.ends_with("/users/u2/view") {
                json!({ "response": { "name": { "fullName": "Grace Hopper" } } })
            } else {
                return Err(TransportError::Status {
                    status: 404,
                    url: req.url.clone(),
                });
            };
            Ok(body.to_string())
        }))
    }

    fn client(transport: Arc<FakeTransport>) -> Arc<IglooClient> {
        Arc::new(IglooClient::with_transport(&test_config(), transport))
    }

    #[tokio::test]
    async fn member_search_applies_default_limit() {
        let tool = SearchMembersTool::new(client(directory()));
        let result = tool.execute(&ToolArgs::from_args(&["member"])).await.unwrap();

        assert!(result
            .message
            .starts_with("Members found for query: \"member\" (Total Results Found: 10):"));
        assert!(result.message.contains("Member ID: u10"));
        assert!(!result.message.contains("Member ID: u11"));
        assert_eq!(result.data.unwrap()["found"], 15);

        let result = tool
            .execute(&ToolArgs::from_args(&["--query=member", "--limit=3"]))
            .await
            .unwrap();
        assert!(result.message.contains("(Total Results Found: 3)"));
    }

    #[test]
    fn member_search_requires_query() {
        let tool = SearchMembersTool::new(client(directory()));
        assert!(tool.validate_args(&ToolArgs::from_args(&[])).is_err());
        assert!(tool.validate_args(&ToolArgs::from_args(&["--query=  "])).is_err());
        assert!(tool.validate_args(&ToolArgs::from_args(&["ada", "--limit=x"])).is_err());
        assert!(tool.validate_args(&ToolArgs::from_args(&["ada"])).is_ok());
    }

    #[tokio::test]
    async fn profile_includes_manager_name() {
        let tool = FetchMemberTool::new(client(directory()));
        let result = tool.execute(&ToolArgs::from_args(&["u1"])).await.unwrap();

        assert!(result.message.starts_with("Member Profile: Ada Lovelace"));
        assert!(result.message.contains("Manager Name: Charles Babbage"));
        assert!(result.message.contains("Job Title: Engineer"));
        assert!(result
            .message
            .contains("Profile URL: https://igloo.example.com/.profile/alovelace"));
    }

    #[tokio::test]
    async fn unknown_manager_does_not_fail_profile() {
        let tool = FetchMemberTool::new(client(directory()));
        let result = tool
            .execute(&ToolArgs::from_args(&["--member_id=u2"]))
            .await
            .unwrap();
        assert!(result.message.starts_with("Member Profile: Grace Hopper"));
        assert!(!result.message.contains("Manager Name"));
    }

    #[tokio::test]
    async fn missing_member_is_an_error() {
        let tool = FetchMemberTool::new(client(directory()));
        assert!(tool.execute(&ToolArgs::from_args(&["nobody"])).await.is_err());
        assert!(tool.validate_args(&ToolArgs::from_args(&[])).is_err());
    }

    #[test]
    fn manager_id_ignores_placeholders() {
        let items = vec![json!({ "Name": "i_report_to", "Value": "null" })];
        assert_eq!(FetchMemberTool::manager_id(&items), None);
        let items = vec![json!({ "Name": "title", "Value": "x" })];
        assert_eq!(FetchMemberTool::manager_id(&items), None);
    }
}
