//! Pure-logic tests for request validation rules shared by the handlers.

use nerofea_core::{file_safety, Difficulty};

#[test]
fn test_empty_title_detection() {
    let empty_titles = vec!["", " ", "  ", "\n", "\t", " \n\t "];
    for title in empty_titles {
        assert!(
            title.trim().is_empty(),
            "Title '{}' should be detected as empty",
            title.escape_default()
        );
    }
}

#[test]
fn test_title_length_cap() {
    let at_cap = "a".repeat(255);
    let over_cap = "a".repeat(256);
    assert!(at_cap.len() <= 255);
    assert!(over_cap.len() > 255, "256-char titles must be rejected");
}

#[test]
fn test_plan_difficulties_parse_from_request_strings() {
    for (input, expected) in [
        ("Easy", Difficulty::Easy),
        ("Medium", Difficulty::Medium),
        ("Hard", Difficulty::Hard),
    ] {
        assert_eq!(input.parse::<Difficulty>().unwrap(), expected);
    }
    assert!("Expert".parse::<Difficulty>().is_err());
}

#[test]
fn test_upload_mime_allow_list_matches_contract() {
    // The documented allow-list: images, PDFs, office documents, text files.
    for mime in [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "application/pdf",
        "text/plain",
        "text/csv",
    ] {
        assert!(file_safety::is_allowed_mime_type(mime), "{} must be allowed", mime);
    }
    for mime in ["video/mp4", "audio/mpeg", "application/zip", "text/html"] {
        assert!(!file_safety::is_allowed_mime_type(mime), "{} must be rejected", mime);
    }
}

#[test]
fn test_upload_rejected_before_storage_write() {
    // validate_upload is a pure function over the raw bytes: a rejection
    // cannot have touched storage.
    let oversized = vec![0u8; 11];
    let result = file_safety::validate_upload("text/plain", &oversized, 10);
    assert!(!result.allowed);
}
