use super::LlmClient;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::GeneratorSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    settings: GeneratorSettings,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(settings: GeneratorSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs);
        Self {
            settings,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.settings
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::GeneratorUnavailable("Missing provider API key".to_string()))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let base_url = self.settings.base_url.trim_end_matches('/');
        let url = format!("{}/v1/messages", base_url);

        let body = MessagesRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let send = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send();

        // The reqwest client carries the same bound, but an explicit deadline
        // keeps slow connects and slow bodies under one limit.
        let response = tokio::time::timeout(
            Duration::from_secs(self.settings.timeout_secs),
            send,
        )
        .await
        .map_err(|_| {
            AppError::GeneratorTimeout(format!(
                "No response within {} seconds",
                self.settings.timeout_secs
            ))
        })?
        .map_err(|e| {
            if e.is_timeout() {
                AppError::GeneratorTimeout(format!("Request timed out: {}", e))
            } else {
                AppError::GeneratorUnavailable(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::GeneratorUnavailable(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::GeneratorUnavailable(format!("Failed to parse JSON: {}", e)))?;

        json.content
            .first()
            .map(|block| block.text.trim().to_string())
            .ok_or_else(|| AppError::GeneratorUnavailable("Empty response".to_string()))
    }
}
