//! reqwest-backed transport

use super::{Method, Request, Response, Transport, TransportError};
use crate::config::ClientConfig;
use async_trait::async_trait;
use tracing::debug;

/// HTTP transport for native and server-side hosts
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("agrolink-sdk/0.1")
            .build()
            .unwrap_or_default();

        Self { http_client }
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http_client.request(method, &request.url);
        if let Some(ref token) = request.bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError(format!("Failed to read response body: {}", e)))?;

        debug!(method = %request.method, url = %request.url, status, "HTTP exchange");

        let body = if text.is_empty() { None } else { Some(text) };
        Ok(Response { status, body })
    }
}
