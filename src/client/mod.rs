//! Igloo REST client
//!
//! Wraps a [`Transport`] with the handful of Igloo endpoints the tools need:
//! session creation, detailed content search, frontend page fetches and the
//! member directory.

pub mod transport;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::IglooConfig;
use crate::search::pagination::{paginate, PageSource, SearchOutcome, SearchResultPage};
use crate::search::request::{SearchError, SearchRequest};
pub use transport::{HttpMethod, HttpRequest, ReqwestTransport, Transport, TransportError};

/// Cookie carrying the session key
pub const AUTH_COOKIE: &str = "iglooAuth";

const SESSION_ENDPOINT: &str = "/.api/api.svc/session/create";
const MEMBER_SEARCH_ENDPOINT: &str = "/.api/api.svc/search/members";

#[derive(Debug, Error)]
pub enum IglooError {
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("URL must belong to community '{community}'. Got: {url}")]
    UrlOutsideCommunity { url: String, community: String },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Client for one Igloo community
pub struct IglooClient {
    community: String,
    community_key: String,
    app_id: String,
    app_pass: String,
    username: String,
    password: String,
    page_size: usize,
    transport: Arc<dyn Transport>,
}

impl IglooClient {
    /// Build a client over the real HTTP transport
    pub fn from_config(config: &IglooConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over any transport
    pub fn with_transport(config: &IglooConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            community: config.community.trim_end_matches('/').to_string(),
            community_key: config.community_key.clone(),
            app_id: config.app_id.clone(),
            app_pass: config.app_pass.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            page_size: config.page_size.max(1),
            transport,
        }
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Send an API request and parse the JSON body
    pub async fn request(
        &self,
        method: &str,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<Value, IglooError> {
        let method: HttpMethod = method
            .parse()
            .map_err(|_| IglooError::InvalidMethod(method.to_string()))?;
        if !endpoint.starts_with('/') {
            return Err(IglooError::InvalidRequest(format!(
                "endpoint must start with '/': {}",
                endpoint
            )));
        }

        let request =
            HttpRequest::new(method, format!("{}{}", self.community, endpoint)).with_query(query);
        let response = self.transport.send(request).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Create a session and store its key as the auth cookie
    pub async fn authenticate(&self) -> Result<(), IglooError> {
        let params = vec![
            ("appId".to_string(), self.app_id.clone()),
            ("appPass".to_string(), self.app_pass.clone()),
            ("apiversion".to_string(), "1".to_string()),
            ("community".to_string(), self.community.clone()),
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ];
        let body = self.request("POST", SESSION_ENDPOINT, params).await?;

        let session_key = body
            .get("response")
            .and_then(|r| r.get("sessionKey"))
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                IglooError::Authentication(format!("Unexpected authentication response: {}", body))
            })?;

        self.transport
            .set_cookie(&self.community, AUTH_COOKIE, session_key)?;
        info!(community = %self.community, "authenticated with Igloo");
        Ok(())
    }

    fn search_endpoint(&self) -> String {
        format!(
            "/.api2/api/v1/communities/{}/search/contentDetailed",
            self.community_key
        )
    }

    /// Run a search, collecting up to `request.limit` records
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, IglooError> {
        let page_size = request.page_size.unwrap_or(self.page_size).max(1);
        let pages = SearchPages {
            client: self,
            endpoint: self.search_endpoint(),
            params: request.query_params(page_size),
        };
        paginate(&pages, page_size, request.limit).await
    }

    /// Check that `url` points inside the configured community
    pub fn validate_community_url(&self, url: &str) -> Result<(), IglooError> {
        let is_valid = url == self.community
            || url.starts_with(&format!("{}/", self.community))
            || url.starts_with(&format!("{}?", self.community));
        if is_valid {
            Ok(())
        } else {
            Err(IglooError::UrlOutsideCommunity {
                url: url.to_string(),
                community: self.community.clone(),
            })
        }
    }

    /// Fetch one frontend page as HTML
    pub async fn fetch_page(&self, url: &str) -> Result<String, IglooError> {
        self.validate_community_url(url)?;
        let request = HttpRequest::new(HttpMethod::Get, url).accept(transport::ACCEPT_HTML);
        let response = self.transport.send(request).await?;
        Ok(response.body)
    }

    /// Fetch several pages concurrently. Each slot holds that URL's own
    /// outcome, in input order; one failure never affects the others.
    pub async fn fetch_pages(&self, urls: &[String]) -> Vec<Result<String, IglooError>> {
        join_all(urls.iter().map(|url| self.fetch_page(url))).await
    }

    /// Raw member directory hits for a name query
    pub async fn search_members(&self, query: &str) -> Result<Vec<Value>, IglooError> {
        let body = self
            .request(
                "GET",
                MEMBER_SEARCH_ENDPOINT,
                vec![("q".to_string(), query.to_string())],
            )
            .await?;
        Ok(body
            .pointer("/response/value/hit")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Basic member record (name, email, namespace)
    pub async fn get_member_info(&self, member_id: &str) -> Result<Value, IglooError> {
        let body = self
            .request("GET", &format!("/.api/api.svc/users/{}/view", member_id), Vec::new())
            .await?;
        Ok(body.get("response").cloned().unwrap_or(Value::Null))
    }

    /// Raw `{Name, Value}` profile items
    pub async fn get_member_profile(&self, member_id: &str) -> Result<Vec<Value>, IglooError> {
        let body = self
            .request(
                "GET",
                &format!("/.api/api.svc/users/{}/viewprofile", member_id),
                Vec::new(),
            )
            .await?;
        Ok(body
            .pointer("/response/items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Best-effort full name lookup; failures are logged and yield `None`
    pub async fn get_member_name(&self, member_id: &str) -> Option<String> {
        match self.get_member_info(member_id).await {
            Ok(info) => info
                .pointer("/name/fullName")
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(e) => {
                warn!(member_id, error = %e, "could not resolve member name");
                None
            }
        }
    }
}

/// Search endpoint pages for one request
struct SearchPages<'a> {
    client: &'a IglooClient,
    endpoint: String,
    params: Vec<(String, String)>,
}

#[async_trait]
impl PageSource for SearchPages<'_> {
    type Error = IglooError;

    async fn fetch_page(&self, offset: usize) -> Result<SearchResultPage, IglooError> {
        let mut params = self.params.clone();
        if offset > 0 {
            params.push(("offset".to_string(), offset.to_string()));
        }
        let body = self.client.request("GET", &self.endpoint, params).await?;
        Ok(SearchResultPage::from_json(&body))
    }
}
