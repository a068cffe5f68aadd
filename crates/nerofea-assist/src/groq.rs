//! Groq chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use nerofea_core::{defaults, ChatBackend, Error, Result};

/// System prompt steering replies toward the study domain.
const SYSTEM_PROMPT: &str = "You are a helpful tutor for students learning data structures \
     and algorithms. Explain concepts clearly and concisely, with short examples where they help.";

/// Groq chat backend (OpenAI-compatible API).
pub struct GroqBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
}

impl GroqBackend {
    /// Create a backend with explicit configuration.
    pub fn with_config(base_url: String, api_key: Option<String>, model: String) -> Self {
        let timeout_secs = std::env::var("NEROFEA_ASSIST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ASSIST_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing Groq backend: url={}, model={}", base_url, model);

        Self {
            client,
            base_url,
            api_key,
            model,
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// Reads `GROQ_API_KEY`, `GROQ_API_BASE`, and `GROQ_CHAT_MODEL`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("GROQ_API_BASE").unwrap_or_else(|_| defaults::GROQ_API_BASE.to_string());
        let model = std::env::var("GROQ_CHAT_MODEL")
            .unwrap_or_else(|_| defaults::GROQ_CHAT_MODEL.to_string());
        let api_key = std::env::var("GROQ_API_KEY").ok();

        Self::with_config(base_url, api_key, model)
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

#[async_trait]
impl ChatBackend for GroqBackend {
    #[instrument(skip(self, message), fields(backend = "groq", model = %self.model, message_len = message.len()))]
    async fn chat(&self, message: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GROQ_API_KEY not configured".to_string()))?;

        let start = Instant::now();

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: message.to_string(),
                },
            ],
            temperature: 0.7,
            max_tokens: 1024,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Assistant(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(format!(
                "Groq API error: {} - {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Assistant(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Assistant("Groq returned no choices".to_string()))?;

        debug!(
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion done"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
