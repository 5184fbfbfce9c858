//! HTTP chat-completion client with endpoint probing.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::ExtractionConfig;
use crate::llm::{InferenceClient, LlmError};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat-completion client probing a prioritized endpoint list; the first
/// endpoint that answers wins.
pub struct HttpInferenceClient {
    http: reqwest::Client,
    endpoints: Vec<String>,
    model: String,
}

impl HttpInferenceClient {
    /// Build a client with the configured endpoints and fail-fast timeout.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Unavailable` when the HTTP client cannot be built.
    pub fn new(config: &ExtractionConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            endpoints: config.llm_endpoints.clone(),
            model: config.llm_model.clone(),
        })
    }

    async fn try_endpoint(
        &self,
        endpoint: &str,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: 1000,
            temperature: 0.1,
            top_p: 0.9,
        };

        let url = format!("{}/chat/completions", endpoint.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Malformed("response carried no choices".into()))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let mut last_error = LlmError::Unavailable("no endpoints configured".into());
        for endpoint in &self.endpoints {
            match self.try_endpoint(endpoint, system, user).await {
                Ok(text) => {
                    debug!(endpoint, "inference endpoint answered");
                    return Ok(text);
                }
                Err(err) => {
                    debug!(endpoint, error = %err, "inference endpoint failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}
