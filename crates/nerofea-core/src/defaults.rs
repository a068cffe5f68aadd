//! Centralized default constants for the nerofea system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Maximum open connections in the PostgreSQL pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait when acquiring a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds before an idle pooled connection is closed.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum upload size in bytes (10 MB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// QUESTION CATALOG CACHE
// =============================================================================

/// Catalog snapshot TTL in seconds.
pub const QUESTION_CACHE_TTL_SECS: u64 = 300;

/// Maximum catalog fetch attempts before surfacing a terminal error.
pub const QUESTION_FETCH_MAX_RETRIES: u32 = 3;

/// Base backoff between catalog fetch attempts in milliseconds.
///
/// Attempt n waits `n * QUESTION_FETCH_BACKOFF_MS` before retrying.
pub const QUESTION_FETCH_BACKOFF_MS: u64 = 1000;

// =============================================================================
// STUDY PLANS
// =============================================================================

/// Maximum plan length in weeks.
pub const PLAN_MAX_WEEKS: u32 = 52;

/// Maximum study hours per week (there are only 168 in a week).
pub const PLAN_MAX_HOURS_PER_WEEK: u32 = 168;

/// Estimated minutes assumed for a question with no recorded estimate.
pub const DEFAULT_QUESTION_MINUTES: i32 = 20;

// =============================================================================
// ASSISTANT BACKENDS
// =============================================================================

/// Groq OpenAI-compatible API base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default Groq chat model.
pub const GROQ_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Hugging Face inference API base URL.
pub const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co";

/// Default Hugging Face text-generation model.
pub const HUGGINGFACE_GEN_MODEL: &str = "deepseek-ai/DeepSeek-R1-Distill-Qwen-32B";

/// Maximum new tokens requested from the text-generation backend.
pub const HUGGINGFACE_MAX_NEW_TOKENS: u32 = 300;

/// Tavily search API endpoint.
pub const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Maximum results requested per Tavily search.
pub const TAVILY_MAX_RESULTS: u32 = 5;

/// Characters of source content included per result in the search digest.
pub const TAVILY_SNIPPET_CHARS: usize = 300;

/// Timeout for assistant backend requests (seconds).
pub const ASSIST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// HTTP SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Default rate limit: requests per period.
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Default rate limit period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;
