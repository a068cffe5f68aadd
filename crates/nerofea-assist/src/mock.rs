//! Mock assistant backends for deterministic testing.
//!
//! Implements all three backend traits with scripted responses and a call
//! log, so handler tests never reach the network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nerofea_assist::mock::MockAssistant;
//!
//! let backend = MockAssistant::new().with_fixed_response("Test response");
//! let reply = backend.chat("explain heaps").await.unwrap();
//! assert_eq!(reply, "Test response");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use nerofea_core::{ChatBackend, Error, Result, TextGenerationBackend, WebSearchBackend};

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Debug, Clone)]
struct MockConfig {
    fixed_responses: HashMap<String, String>,
    default_response: String,
    fail_with: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fixed_responses: HashMap::new(),
            default_response: "Mock response".to_string(),
            fail_with: None,
        }
    }
}

/// Mock backend implementing chat, generation, and search.
#[derive(Clone, Default)]
pub struct MockAssistant {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockAssistant {
    /// Create a mock with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned for any unscripted input.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Script a response for a specific input.
    pub fn with_response_mapping(
        mut self,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(input.into(), output.into());
        self
    }

    /// Make every call fail with an assistant error.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).fail_with = Some(message.into());
        self
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    fn respond(&self, operation: &str, input: &str) -> Result<String> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });

        if let Some(message) = &self.config.fail_with {
            return Err(Error::Assistant(message.clone()));
        }

        Ok(self
            .config
            .fixed_responses
            .get(input)
            .cloned()
            .unwrap_or_else(|| self.config.default_response.clone()))
    }
}

#[async_trait]
impl ChatBackend for MockAssistant {
    async fn chat(&self, message: &str) -> Result<String> {
        self.respond("chat", message)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl TextGenerationBackend for MockAssistant {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.respond("generate", prompt)
    }
}

#[async_trait]
impl WebSearchBackend for MockAssistant {
    async fn search(&self, query: &str) -> Result<String> {
        self.respond("search", query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_response() {
        let mock = MockAssistant::new();
        assert_eq!(mock.chat("anything").await.unwrap(), "Mock response");
    }

    #[tokio::test]
    async fn test_scripted_response() {
        let mock = MockAssistant::new().with_response_mapping("heaps", "a heap answer");
        assert_eq!(mock.chat("heaps").await.unwrap(), "a heap answer");
        assert_eq!(mock.generate("other").await.unwrap(), "Mock response");
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let mock = MockAssistant::new().with_failure("backend down");
        assert!(matches!(
            mock.search("query").await,
            Err(Error::Assistant(msg)) if msg == "backend down"
        ));
    }

    #[tokio::test]
    async fn test_call_log_records_operations() {
        let mock = MockAssistant::new();
        let _ = mock.chat("a").await;
        let _ = mock.search("b").await;
        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].operation, "chat");
        assert_eq!(calls[1].operation, "search");
    }
}
