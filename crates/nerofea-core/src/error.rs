//! Error types for nerofea.

use thiserror::Error;

/// Result type alias using nerofea's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nerofea operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Topic not found
    #[error("Topic not found: {0}")]
    TopicNotFound(uuid::Uuid),

    /// Assistant backend call failed
    #[error("Assistant error: {0}")]
    Assistant(String),

    /// Study plan generation failed
    #[error("Plan error: {0}")]
    Plan(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Upload rejected by validation
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_topic_not_found() {
        let id = Uuid::nil();
        let err = Error::TopicNotFound(id);
        assert_eq!(err.to_string(), format!("Topic not found: {}", id));
    }

    #[test]
    fn test_error_display_assistant() {
        let err = Error::Assistant("model timeout".to_string());
        assert_eq!(err.to_string(), "Assistant error: model timeout");
    }

    #[test]
    fn test_error_display_plan() {
        let err = Error::Plan("no questions fit".to_string());
        assert_eq!(err.to_string(), "Plan error: no questions fit");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing API key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("weeks must be >= 1".to_string());
        assert_eq!(err.to_string(), "Invalid input: weeks must be >= 1");
    }

    #[test]
    fn test_error_display_upload_rejected() {
        let err = Error::UploadRejected("file too large".to_string());
        assert_eq!(err.to_string(), "Upload rejected: file too large");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
