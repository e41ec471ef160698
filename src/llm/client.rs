//! Anthropic Messages API client.
//!
//! Sends a message history plus the tool catalog and returns the model's
//! ordered content blocks. The [`ModelApi`] trait is the seam the
//! orchestrator works against; tests substitute scripted implementations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::errors::LlmError;
use super::types::{MessagesRequest, MessagesResponse};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default Messages API endpoint.
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─── ModelApi ────────────────────────────────────────────────────────────────

/// The reasoning service, consumed as a black-box request/response API.
#[async_trait]
pub trait ModelApi: Send + Sync {
    /// Send a message history and tool catalog, returning the model's
    /// content blocks.
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse, LlmError>;
}

// ─── AnthropicClient ─────────────────────────────────────────────────────────

/// HTTP client for the Anthropic Messages API.
pub struct AnthropicClient {
    http: HttpClient,
    api_key: String,
    endpoint: String,
}

impl AnthropicClient {
    /// Create a client authenticating with the given API key.
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Connection {
                endpoint: ANTHROPIC_API_URL.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_key,
            endpoint: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Override the endpoint (proxies, compatible gateways).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl ModelApi for AnthropicClient {
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse, LlmError> {
        tracing::debug!(
            model = %request.model,
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "messages API request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        duration_secs: REQUEST_TIMEOUT.as_secs(),
                    }
                } else {
                    LlmError::Connection {
                        endpoint: self.endpoint.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| LlmError::Parse {
                reason: e.to_string(),
            })
    }
}

/// Truncate a string on a char boundary for error messages.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}...(truncated)")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
