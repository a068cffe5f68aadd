//! Library surface of nerofea-api.
//!
//! The binary lives in `main.rs`; this crate root exposes the service layer
//! so integration tests can exercise it directly.

pub mod services;
