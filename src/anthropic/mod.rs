//! Client for the Anthropic messages API
//!
//! The search pipeline needs exactly one model operation: send a system
//! instruction plus a user prompt, get the generated text back. Sampling is
//! always at temperature 0 so judgments are reproducible.

pub mod types;

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument};
use types::{Message, MessagesRequest, MessagesResponse};

/// Default API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value
const API_VERSION: &str = "2023-06-01";

/// Timeout for completion requests in seconds
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A single-call completion model
///
/// The judge and orchestrator work against this trait so tests can supply
/// canned responses.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate text from a system instruction and a user prompt
    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Client for the Anthropic messages API
#[derive(Debug, Clone)]
pub struct Client {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Base URL for API requests
    base_url: String,

    /// API key for authentication
    api_key: String,

    /// Model identifier used for every request
    model: String,
}

impl Client {
    /// Create a new client with an API key and model name
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a new client against a custom endpoint
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// The model identifier this client requests
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionModel for Client {
    #[instrument(skip(self, system, prompt), level = "debug")]
    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature: 0.0,
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!("Requesting completion from model {}", self.model);
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            error!("Model API error: {} - {}", status, body);
            return if status == StatusCode::UNAUTHORIZED {
                Err(Error::Auth("Invalid model API key".to_string()))
            } else {
                Err(Error::Api {
                    status_code: status.as_u16(),
                    message: body,
                })
            };
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse model response: {}", e);
            Error::UnexpectedResponse(format!("Failed to parse model response: {}", e))
        })?;

        Ok(parsed.text())
    }
}
