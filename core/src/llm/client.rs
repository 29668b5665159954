//! LLM client seam and the Anthropic messages-API implementation.

use crate::{
    config::LlmConfig,
    error::{SeedError, SeedResult},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// A text-completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a system + user prompt, return the raw text reply.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> SeedResult<String>;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}

/// Anthropic Claude messages API client
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Build a client from config. Returns `Ok(None)` when no API key is
    /// configured, which puts the pipeline in fallback mode.
    pub fn from_config(config: &LlmConfig) -> SeedResult<Option<Self>> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Some(Self {
            api_key: api_key.to_string(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client,
        }))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> SeedResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": &self.model,
                "max_tokens": self.max_tokens,
                "system": system_prompt,
                "messages": [{"role": "user", "content": user_prompt}]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SeedError::LlmApi { status, body });
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            text: Option<String>,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            content: Vec<ContentBlock>,
        }

        let api_response: ApiResponse = response.json().await?;
        let text: String = api_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        if text.trim().is_empty() {
            return Err(SeedError::MalformedResponse("empty completion".into()));
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
