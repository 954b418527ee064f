//! Real HTTP transport backed by `reqwest`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::framework::{ApiClient, ApiResponse, FrameworkError, Method, RequestOptions};

/// Sends requests to a live portal.
///
/// Non-JSON bodies are kept as a JSON string so validation can still report
/// on them; empty bodies become `null`.
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FrameworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FrameworkError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn map_error(e: reqwest::Error) -> FrameworkError {
    if e.is_timeout() {
        FrameworkError::Timeout(e.to_string())
    } else {
        FrameworkError::Transport(e.to_string())
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn send(&self, request: RequestOptions) -> Result<ApiResponse, FrameworkError> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let bytes = response.bytes().await.map_err(map_error)?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(%url, status, error = %e, "Response body is not JSON");
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        let mut parsed = ApiResponse::new(status, body);
        for (name, value) in headers {
            parsed = parsed.with_header(&name, value);
        }
        Ok(parsed)
    }
}
