//! Service layer for nerofea-api.

pub mod question_cache;

pub use question_cache::QuestionCache;
