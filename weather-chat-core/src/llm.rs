//! Chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

use crate::{
    config::{HttpConfig, LlmConfig},
    error::{LlmError, truncate_body},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Anything that can turn a conversation into a reply.
#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` endpoint with bearer auth.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    endpoint: String,
    model: String,
    api_key: String,
    http: Client,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig, api_key: String, http: &HttpConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(http.timeout()).build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            http: client,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        debug!(endpoint = %self.endpoint, model = %self.model, "calling language model");

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { model: &self.model, messages })
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(LlmError::Status { status, body: truncate_body(&body) });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;

        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        let content = choice
            .message
            .content
            .ok_or_else(|| LlmError::Decode("choice has no message content".to_string()))?;

        Ok(content.trim().to_string())
    }
}
