//! Network transport
//!
//! The SDK never talks to the network directly. It hands a [`Request`] to an
//! injected [`Transport`] and gets back either a [`Response`] (any status) or
//! a [`TransportError`] meaning the server was not reached at all.

#[cfg(feature = "client")]
mod http;
mod mock;

#[cfg(feature = "client")]
pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Bearer token sent as `Authorization: Bearer ...`
    pub bearer: Option<String>,
    /// JSON body
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response that reached us, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Raw body; `None` when the server sent nothing
    pub body: Option<String>,
}

impl Response {
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_rejection(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    /// Parse the body as JSON. `None` if absent or not JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        let body = self.body.as_deref()?;
        serde_json::from_str(body).ok()
    }
}

/// The request never produced a response (DNS, refused, timeout...)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Injected "fetch a URL" capability
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json() {
        let ok = Response::new(200, Some("[]".into()));
        assert_eq!(ok.json(), Some(serde_json::json!([])));
        assert!(ok.is_success());

        let empty = Response::new(204, None);
        assert_eq!(empty.json(), None);

        let html = Response::new(200, Some("<html>".into()));
        assert_eq!(html.json(), None);
    }

    #[test]
    fn test_blank_bearer_is_dropped() {
        let request = Request::get("http://x/y").with_bearer(Some(""));
        assert!(request.bearer.is_none());
        let request = Request::get("http://x/y").with_bearer(Some("abc"));
        assert_eq!(request.bearer.as_deref(), Some("abc"));
    }
}
