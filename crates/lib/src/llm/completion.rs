//! Completion endpoint client: one HTTP POST per reply.
//!
//! Cancellation is raced against the in-flight request and reported as a
//! dedicated error kind so the caller can tell a stop from a failure.

use crate::cancel::CancelToken;
use crate::config::ApiConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One turn in the context window sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion cancelled")]
    Cancelled,
}

/// Client for the remote completion endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    endpoint: String,
    model: String,
    format: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(endpoint: impl Into<String>, api: &ApiConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: api.model.clone(),
            format: api.format.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    /// POST the context window. Returns the assistant text, or None when
    /// the response was successful but carried no usable content.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        cancel: &CancelToken,
    ) -> Result<Option<String>, CompletionError> {
        if cancel.is_cancelled() {
            return Err(CompletionError::Cancelled);
        }
        let body = CompletionRequest {
            model: self.model.clone(),
            messages,
            format: self.format.clone(),
        };
        let send = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send();
        let res = tokio::select! {
            res = send => res?,
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
        };
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Api(format!("{} {}", status, body)));
        }
        let read = res.json::<CompletionResponse>();
        let data = tokio::select! {
            data = read => data?,
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
        };
        Ok(data.reply().map(str::to_string))
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    format: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

impl CompletionResponse {
    /// Content of the first choice, if any and non-empty.
    fn reply(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}
