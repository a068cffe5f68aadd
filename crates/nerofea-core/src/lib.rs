//! # nerofea-core
//!
//! Core types, traits, and abstractions for the nerofea study-notes server.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other nerofea crates depend on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{
    is_allowed_mime_type, is_valid_mime_type, sanitize_filename, validate_upload, ValidationResult,
};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;
