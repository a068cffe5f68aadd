//! Tavily web-search backend.
//!
//! Runs an advanced-depth search and folds the answer plus top sources into
//! a markdown digest suitable for pasting into a note.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use nerofea_core::{defaults, Error, Result, WebSearchBackend};

/// Tavily search backend.
pub struct TavilyBackend {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl TavilyBackend {
    /// Create a backend with explicit configuration.
    pub fn with_config(api_url: String, api_key: Option<String>) -> Self {
        let timeout_secs = std::env::var("NEROFEA_ASSIST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ASSIST_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing Tavily backend: url={}", api_url);

        Self {
            client,
            api_url,
            api_key,
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// Reads `TAVILY_API_KEY` and `TAVILY_API_URL`.
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("TAVILY_API_URL").unwrap_or_else(|_| defaults::TAVILY_API_URL.to_string());
        let api_key = std::env::var("TAVILY_API_KEY").ok();

        Self::with_config(api_url, api_key)
    }
}

#[derive(Serialize)]
struct SearchRequest {
    query: String,
    search_depth: &'static str,
    include_answer: bool,
    include_raw_content: bool,
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Fold a search response into the markdown digest.
fn format_digest(response: &SearchResponse) -> String {
    let mut content = String::new();

    if let Some(answer) = response.answer.as_deref().filter(|a| !a.is_empty()) {
        content.push_str(&format!("**Direct Answer:**\n{}\n\n", answer));
    }

    if response.results.is_empty() {
        content.push_str("No specific sources found for this query.");
        return content;
    }

    content.push_str("**Research Sources:**\n\n");
    for (index, result) in response.results.iter().enumerate() {
        let title = result.title.as_deref().unwrap_or("Untitled");
        content.push_str(&format!("**{}. {}**\n", index + 1, title));
        if let Some(url) = result.url.as_deref() {
            content.push_str(&format!("🔗 {}\n", url));
        }
        if let Some(text) = result.content.as_deref() {
            let clamp = defaults::TAVILY_SNIPPET_CHARS;
            let snippet: String = text.chars().take(clamp).collect();
            let ellipsis = if text.chars().count() > clamp { "..." } else { "" };
            content.push_str(&format!("📄 {}{}\n\n", snippet, ellipsis));
        }
    }

    content
}

#[async_trait]
impl WebSearchBackend for TavilyBackend {
    #[instrument(skip(self, query), fields(backend = "tavily", query_len = query.len()))]
    async fn search(&self, query: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| {
                Error::Config("TAVILY_API_KEY not configured in environment variables".to_string())
            })?;

        let request = SearchRequest {
            query: query.to_string(),
            search_depth: "advanced",
            include_answer: true,
            include_raw_content: false,
            max_results: defaults::TAVILY_MAX_RESULTS,
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Assistant(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(format!(
                "Tavily API error: {} - {}",
                status, body
            )));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Assistant(format!("Failed to parse response: {}", e)))?;

        let digest = format_digest(&search);
        debug!(
            result_count = search.results.len(),
            has_answer = search.answer.is_some(),
            "Search digest assembled"
        );
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, content: &str) -> SearchResult {
        SearchResult {
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn test_digest_with_answer_and_sources() {
        let response = SearchResponse {
            answer: Some("Heaps are complete binary trees.".to_string()),
            results: vec![result(
                "Heap basics",
                "https://example.com/heaps",
                "A heap is...",
            )],
        };
        let digest = format_digest(&response);
        assert!(digest.starts_with("**Direct Answer:**\nHeaps are complete binary trees.\n\n"));
        assert!(digest.contains("**Research Sources:**"));
        assert!(digest.contains("**1. Heap basics**"));
        assert!(digest.contains("🔗 https://example.com/heaps"));
        assert!(digest.contains("📄 A heap is..."));
    }

    #[test]
    fn test_digest_without_sources() {
        let response = SearchResponse {
            answer: None,
            results: vec![],
        };
        assert_eq!(
            format_digest(&response),
            "No specific sources found for this query."
        );
    }

    #[test]
    fn test_digest_clamps_long_content() {
        let long = "x".repeat(500);
        let response = SearchResponse {
            answer: None,
            results: vec![result("Long", "https://example.com", &long)],
        };
        let digest = format_digest(&response);
        let expected = format!("📄 {}...", "x".repeat(defaults::TAVILY_SNIPPET_CHARS));
        assert!(digest.contains(&expected));
    }

    #[test]
    fn test_digest_untitled_source() {
        let response = SearchResponse {
            answer: None,
            results: vec![SearchResult {
                title: None,
                url: None,
                content: None,
            }],
        };
        let digest = format_digest(&response);
        assert!(digest.contains("**1. Untitled**"));
    }

    #[test]
    fn test_digest_numbers_sources_in_order() {
        let response = SearchResponse {
            answer: None,
            results: vec![
                result("A", "https://a", "aa"),
                result("B", "https://b", "bb"),
                result("C", "https://c", "cc"),
            ],
        };
        let digest = format_digest(&response);
        let pos_a = digest.find("**1. A**").unwrap();
        let pos_b = digest.find("**2. B**").unwrap();
        let pos_c = digest.find("**3. C**").unwrap();
        assert!(pos_a < pos_b && pos_b < pos_c);
    }
}
