//! Hugging Face text-generation backend.
//!
//! The inference API is flaky while models load, so this backend degrades
//! instead of failing: a 503 or an unusably short response yields canned
//! text rather than an error.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{info, instrument, warn};

use nerofea_core::{defaults, Error, Result, TextGenerationBackend};

/// Returned when the upstream model is still loading (HTTP 503).
pub fn model_loading_fallback(prompt: &str) -> String {
    format!(
        "Generated response for: \"{}\"\n\nThis is an educational response about your query. \
         The AI model is currently loading - please try again in a moment for a more \
         detailed response.",
        prompt
    )
}

/// Returned when the upstream produced nothing usable.
pub fn educational_fallback(prompt: &str) -> String {
    format!(
        "Educational response for: \"{}\"\n\nThis topic involves important concepts that would \
         benefit from further exploration. Consider researching the fundamentals and practical \
         applications of this subject.",
        prompt
    )
}

/// Catch-all degradation used by the API layer when the backend errors.
pub const SERVICE_UNAVAILABLE_FALLBACK: &str = "The AI text generation service is temporarily \
     unavailable. Please try again later or use the other AI features available.";

/// Hugging Face inference backend.
pub struct HuggingFaceBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
}

impl HuggingFaceBackend {
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

        info!(
            "Initializing Hugging Face backend: url={}, model={}",
            base_url, model
        );

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
    /// Reads `HF_API_KEY`, `HF_API_BASE`, and `HF_GEN_MODEL`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("HF_API_BASE")
            .unwrap_or_else(|_| defaults::HUGGINGFACE_API_BASE.to_string());
        let model = std::env::var("HF_GEN_MODEL")
            .unwrap_or_else(|_| defaults::HUGGINGFACE_GEN_MODEL.to_string());
        let api_key = std::env::var("HF_API_KEY").ok();

        Self::with_config(base_url, api_key, model)
    }

    /// Pull generated text out of the API's two response shapes
    /// (array-of-objects or bare object, `generated_text` or `text`).
    fn extract_generated_text(body: &JsonValue) -> String {
        let field = |obj: &JsonValue| -> Option<String> {
            obj.get("generated_text")
                .or_else(|| obj.get("text"))
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
        };

        match body {
            JsonValue::Array(items) => items.first().and_then(field).unwrap_or_default(),
            other => field(other).unwrap_or_default(),
        }
    }

    /// Some models echo the prompt ahead of the continuation; strip it.
    fn strip_prompt_echo(generated: &str, prompt: &str) -> String {
        match generated.find(prompt) {
            Some(idx) => generated[idx + prompt.len()..].trim().to_string(),
            None => generated.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    do_sample: bool,
    return_full_text: bool,
    stop: Vec<&'static str>,
}

#[derive(Serialize)]
struct GenerationOptions {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Serialize)]
struct GenerationRequest {
    inputs: String,
    parameters: GenerationParameters,
    options: GenerationOptions,
}

#[async_trait]
impl TextGenerationBackend for HuggingFaceBackend {
    #[instrument(skip(self, prompt), fields(backend = "huggingface", model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("HF_API_KEY not configured".to_string()))?;

        let request = GenerationRequest {
            inputs: prompt.to_string(),
            parameters: GenerationParameters {
                max_new_tokens: defaults::HUGGINGFACE_MAX_NEW_TOKENS,
                temperature: 0.7,
                do_sample: true,
                return_full_text: false,
                stop: vec!["</s>", "\n\n"],
            },
            options: GenerationOptions {
                wait_for_model: true,
                use_cache: false,
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .timeout(Duration::from_secs(self.timeout_secs))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Assistant(format!("Request failed: {}", e)))?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            warn!("Model is loading, returning canned fallback");
            return Ok(model_loading_fallback(prompt));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(format!(
                "HuggingFace API error: {} - {}",
                status, body
            )));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| Error::Assistant(format!("Failed to parse response: {}", e)))?;

        let mut generated = Self::extract_generated_text(&body);
        if generated.contains(prompt) {
            generated = Self::strip_prompt_echo(&generated, prompt);
        }

        if generated.len() < 10 {
            return Ok(educational_fallback(prompt));
        }

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_array_shape() {
        let body = json!([{ "generated_text": "  an answer  " }]);
        assert_eq!(
            HuggingFaceBackend::extract_generated_text(&body),
            "an answer"
        );
    }

    #[test]
    fn test_extract_from_object_shape() {
        let body = json!({ "text": "plain text field" });
        assert_eq!(
            HuggingFaceBackend::extract_generated_text(&body),
            "plain text field"
        );
    }

    #[test]
    fn test_extract_from_empty_body() {
        assert_eq!(HuggingFaceBackend::extract_generated_text(&json!([])), "");
        assert_eq!(HuggingFaceBackend::extract_generated_text(&json!({})), "");
    }

    #[test]
    fn test_strip_prompt_echo() {
        let out = HuggingFaceBackend::strip_prompt_echo(
            "what is a heap? A heap is a tree-shaped priority structure.",
            "what is a heap?",
        );
        assert_eq!(out, "A heap is a tree-shaped priority structure.");
    }

    #[test]
    fn test_strip_prompt_echo_absent() {
        let out = HuggingFaceBackend::strip_prompt_echo("standalone answer", "unrelated prompt");
        assert_eq!(out, "standalone answer");
    }
}
