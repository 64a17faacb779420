//! # Transport
//!
//! The seam between the dispatcher and whatever answers a call.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Transport Layer                                │
//! │                                                                         │
//! │   ApiRequest { method, path, query, body }  +  bearer token (optional) │
//! │                          │                                              │
//! │          ┌───────────────┴────────────────┐                            │
//! │          ▼                                ▼                             │
//! │  ┌────────────────┐              ┌────────────────┐                    │
//! │  │ HttpTransport  │              │  MockBackend   │                    │
//! │  │ (reqwest)      │              │  (in memory)   │                    │
//! │  └───────┬────────┘              └───────┬────────┘                    │
//! │          └───────────────┬────────────────┘                            │
//! │                          ▼                                              │
//! │    Ok(JSON body)                                                       │
//! │    Err(TransportError::Network)   no response obtained                 │
//! │    Err(TransportError::Status)    error status + server message        │
//! │    Err(TransportError::Decode)    unreadable body                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult, TransportError};

// =============================================================================
// Request Description
// =============================================================================

/// HTTP verb of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// One backend call, independent of who answers it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/api/orders`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// POST with a JSON body.
    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Self::new(Method::Post, path).with_body(body)
    }

    /// PUT with a JSON body.
    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> ClientResult<Self> {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(|e| {
            ClientError::Internal(format!("Failed to encode request body: {}", e))
        })?);
        Ok(self)
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// First query value for `key`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path split into its non-empty segments.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Anything that can answer an [`ApiRequest`].
///
/// `token` is the caller's bearer token; implementations attach it when
/// present and simply omit it otherwise.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Value, TransportError>;
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// Transport for the real marketplace backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Ok(HttpTransport {
            client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends the request path to the base URL's own path, so a base of
    /// `http://host/backend` sends `/api/products` to `/backend/api/products`.
    fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        if self.base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidRequest(format!(
                "Base URL cannot carry a path: {}",
                self.base_url
            )));
        }

        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Value, TransportError> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Message carried by an error body.
///
/// Uses the JSON `message` field, then `error`, then a generic text.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_message_then_error() {
        assert_eq!(
            error_message(400, r#"{"message":"Invalid product","error":"Bad Request"}"#),
            "Invalid product"
        );
        assert_eq!(error_message(401, r#"{"error":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(error_message(502, "<html>gateway</html>"), "Request failed with status 502");
    }

    #[test]
    fn test_url_joins_path_and_encodes_query() {
        let transport = HttpTransport::new("http://localhost:8080").unwrap();
        let request = ApiRequest::get("/api/maps/geocode").with_query("address", "MG Road, Bangalore");

        let url = transport.url_for(&request).unwrap();
        assert_eq!(url.path(), "/api/maps/geocode");
        assert_eq!(url.query(), Some("address=MG+Road%2C+Bangalore"));
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        for base in ["http://localhost:8080/backend", "http://localhost:8080/backend/"] {
            let transport = HttpTransport::new(base).unwrap();
            let url = transport.url_for(&ApiRequest::get("/api/products")).unwrap();
            assert_eq!(url.as_str(), "http://localhost:8080/backend/api/products");
        }
    }

    #[test]
    fn test_unusable_base_is_not_a_network_failure() {
        let transport = HttpTransport::new("mailto:orders@harvesthub.example").unwrap();
        let err = transport.url_for(&ApiRequest::get("/api/products")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
        assert!(!ClientError::from(err).is_network_failure());
    }

    #[test]
    fn test_request_helpers() {
        let request = ApiRequest::post("/api/farmer/products/7", &json!({ "name": "Kale" })).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.segments(), vec!["api", "farmer", "products", "7"]);
        assert_eq!(request.body.unwrap()["name"], "Kale");

        let request = ApiRequest::get("/api/maps/distance").with_query("originLat", 12.5);
        assert_eq!(request.query_param("originLat"), Some("12.5"));
        assert_eq!(request.query_param("destLat"), None);
    }
}
