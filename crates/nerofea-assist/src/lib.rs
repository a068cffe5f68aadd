//! # nerofea-assist
//!
//! Assistant backend abstraction for nerofea.
//!
//! This crate provides:
//! - Groq chat-completions backend (the "explain" mode)
//! - Hugging Face text-generation backend with canned degradation
//!   (the "generate" mode)
//! - Tavily web-search backend producing a markdown digest
//!   (the "research" mode)
//!
//! All backends implement the traits from `nerofea-core` so the API layer
//! can substitute mocks in tests.
//!
//! # Feature Flags
//!
//! - `mock`: Enable scripted mock backends for consumers' tests

pub mod groq;
pub mod huggingface;
pub mod tavily;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use nerofea_core::{ChatBackend, Error, Result, TextGenerationBackend, WebSearchBackend};

pub use groq::GroqBackend;
pub use huggingface::{HuggingFaceBackend, SERVICE_UNAVAILABLE_FALLBACK};
pub use tavily::TavilyBackend;
