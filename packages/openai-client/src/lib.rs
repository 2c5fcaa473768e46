//! Pure OpenAI REST API client
//!
//! A clean, minimal client for the OpenAI API with no domain-specific
//! logic. Supports chat completions, type-safe structured outputs,
//! vision (multimodal messages), and audio transcription.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-4o").message(Message::user("Hello!")),
//! ).await?;
//! ```
//!
//! # Type-Safe Structured Output
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Recipe {
//!     title: String,
//!     ingredients: Vec<String>,
//! }
//!
//! // Schema generated automatically from the type
//! let (recipe, usage) = client
//!     .extract::<Recipe>("gpt-4o", system_prompt, user_prompt)
//!     .await?;
//! ```

pub mod audio;
pub mod error;
pub mod schema;
pub mod types;

pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use reqwest::Client;
use tracing::debug;

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Send a chat completion request.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!(model = %request.model, messages = request.messages.len(), "chat completion");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAIError::Api(format!("HTTP {status}: {body}")));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }

    /// Type-safe structured extraction from a text prompt.
    ///
    /// Generates a strict JSON schema from `T`, sends it as the response
    /// format, and deserializes the model's answer. Returns token usage
    /// alongside the value for cost accounting.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<(T, Usage)> {
        self.extract_parts(model, system, vec![ContentPart::text(user)])
            .await
    }

    /// Structured extraction from multimodal content (text and images).
    pub async fn extract_parts<T: StructuredOutput>(
        &self,
        model: &str,
        system: &str,
        parts: Vec<ContentPart>,
    ) -> Result<(T, Usage)> {
        let request = ChatRequest::new(model)
            .message(Message::system(system))
            .message(Message::user_parts(parts))
            .temperature(0.0)
            .response_format(T::response_format());

        let response = self.chat_completion(request).await?;
        let usage = response.usage.unwrap_or_default();
        let content = response
            .content()
            .ok_or_else(|| OpenAIError::Parse("empty completion".into()))?;

        let value = serde_json::from_str(content)
            .map_err(|e| OpenAIError::Parse(format!("{e}: {content}")))?;
        Ok((value, usage))
    }
}
