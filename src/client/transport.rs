//! HTTP transport seam
//!
//! The Igloo client talks to the network only through [`Transport`], so the
//! pagination and fetch logic can be driven by an in-memory fake in tests.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::IglooConfig;

/// Accept header for API calls
pub const ACCEPT_JSON: &str = "application/json";
/// Accept header for frontend page fetches
pub const ACCEPT_HTML: &str = "text/html";

/// Per-request transport failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Request to {url} timed out")]
    Timeout { url: String },
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// HTTP methods the Igloo API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!("Invalid HTTP method: {}", s)),
        }
    }
}

/// One outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub accept: &'static str,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            accept: ACCEPT_JSON,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    /// Look up a query parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub body: String,
}

/// Concurrent-capable HTTP primitive with a persistent cookie session
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request. Non-2xx statuses are returned as [`TransportError::Status`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Store a session cookie for all later requests to `base_url`
    fn set_cookie(&self, base_url: &str, name: &str, value: &str) -> Result<(), TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client and cookie jar
pub struct ReqwestTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new(config: &IglooConfig) -> anyhow::Result<Self> {
        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_ssl);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            jar,
        })
    }

    /// Messages never carry the request URL; its query holds credentials.
    fn map_error(url: &str, err: reqwest::Error) -> TransportError {
        let err = err.without_url();
        if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            TransportError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        debug!(method = %request.method, url = %request.url, params = request.query.len(), "sending request");

        let response = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, request.accept)
            .query(&request.query)
            .send()
            .await
            .map_err(|e| Self::map_error(&request.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: request.url,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(&request.url, e))?;

        Ok(HttpResponse { body })
    }

    fn set_cookie(&self, base_url: &str, name: &str, value: &str) -> Result<(), TransportError> {
        let url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        self.jar
            .add_cookie_str(&format!("{}={}; Path=/", name, value), &url);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_rejects_unknown_verbs() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("DELETE".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn request_builder_collects_params() {
        let req = HttpRequest::new(HttpMethod::Get, "https://x.example/a")
            .with_query(vec![("offset".to_string(), "50".to_string())])
            .accept(ACCEPT_HTML);
        assert_eq!(req.param("offset"), Some("50"));
        assert_eq!(req.param("limit"), None);
        assert_eq!(req.accept, "text/html");
    }

    #[test]
    fn reqwest_transport_builds_from_config() {
        let config = IglooConfig {
            proxy: Some("http://proxy.example:3128".to_string()),
            verify_ssl: false,
            ..IglooConfig::default()
        };
        let transport = ReqwestTransport::new(&config).unwrap();
        assert!(transport
            .set_cookie("https://igloo.example.com", "iglooAuth", "abc")
            .is_ok());
        assert!(matches!(
            transport.set_cookie("not a url", "iglooAuth", "abc"),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_sending() {
        let transport = ReqwestTransport::new(&IglooConfig::default()).unwrap();
        let err = transport
            .send(HttpRequest::new(HttpMethod::Get, "::nope::"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn network_errors_do_not_echo_query_credentials() {
        let config = IglooConfig {
            timeout_secs: 5,
            ..IglooConfig::default()
        };
        let transport = ReqwestTransport::new(&config).unwrap();
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/.api/api.svc/session/create")
            .with_query(vec![
                ("appPass".to_string(), "app-secret".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ]);

        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Network { .. }
                | TransportError::Timeout { .. }
                | TransportError::Status { .. }
        ));
        let message = err.to_string();
        assert!(message.contains("http://127.0.0.1:9/.api/api.svc/session/create"));
        assert!(!message.contains('?'), "{}", message);
        assert!(!message.contains("app-secret"), "{}", message);
        assert!(!message.contains("hunter2"), "{}", message);
    }
}
