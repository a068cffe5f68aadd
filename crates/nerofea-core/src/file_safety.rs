//! Upload validation for note attachments.
//!
//! Three layers, all applied before any storage write:
//! 1. Size cap
//! 2. MIME allow-list (images, PDFs, office documents, text files)
//! 3. Magic byte detection for executables smuggled under an allowed type

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// MIME types accepted for attachment uploads.
pub static ALLOWED_MIME_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "application/pdf",
        "text/plain",
        "text/csv",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ]
    .into_iter()
    .collect()
});

/// Magic byte signatures for executable files.
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),
    ("WebAssembly", &[0x00, 0x61, 0x73, 0x6D]),
];

/// Result of upload validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            block_reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
        }
    }
}

/// Check whether a MIME type is on the attachment allow-list.
pub fn is_allowed_mime_type(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(mime)
}

/// Validate MIME type format per RFC 2045 (type/subtype).
pub fn is_valid_mime_type(mime: &str) -> bool {
    let parts: Vec<&str> = mime.split('/').collect();
    if parts.len() != 2 {
        return false;
    }
    let (media_type, subtype) = (parts[0], parts[1]);
    if media_type.is_empty() || subtype.is_empty() {
        return false;
    }
    let is_token_char = |c: char| -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '!' | '#' | '$' | '&' | '-' | '^' | '_' | '.' | '+')
    };
    media_type.chars().all(is_token_char) && subtype.chars().all(is_token_char)
}

/// Validate an upload against the size cap, MIME allow-list, and executable
/// magic bytes. Runs before any storage write.
pub fn validate_upload(mime_type: &str, data: &[u8], max_size_bytes: u64) -> ValidationResult {
    if data.len() as u64 > max_size_bytes {
        return ValidationResult::blocked(format!(
            "File size too large. Maximum {} bytes allowed.",
            max_size_bytes
        ));
    }

    if !is_valid_mime_type(mime_type) || !is_allowed_mime_type(mime_type) {
        return ValidationResult::blocked(
            "File type not allowed. Please upload images, PDFs, documents, or text files.",
        );
    }

    for (name, magic) in MAGIC_SIGNATURES {
        if data.len() >= magic.len() && &data[..magic.len()] == *magic {
            return ValidationResult::blocked(format!("Executable file detected: {}", name));
        }
    }

    // Cross-check with infer for executable formats the table above missed.
    if let Some(kind) = infer::get(data) {
        let detected = kind.mime_type();
        if matches!(
            detected,
            "application/x-executable"
                | "application/vnd.microsoft.portable-executable"
                | "application/x-mach-binary"
                | "application/x-sharedlib"
                | "application/wasm"
        ) {
            return ValidationResult::blocked(format!("Executable file detected: {}", detected));
        }
    }

    ValidationResult::allowed()
}

/// Sanitize a filename for safe storage.
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > 255 {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            let name = &sanitized[..255 - ext.len()];
            return format!("{}{}", name, ext);
        }
        return sanitized[..255].to_string();
    }

    sanitized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MAX_UPLOAD_SIZE_BYTES;

    #[test]
    fn test_allows_png() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let result = validate_upload("image/png", &png_header, MAX_UPLOAD_SIZE_BYTES as u64);
        assert!(result.allowed);
    }

    #[test]
    fn test_allows_pdf() {
        let result = validate_upload("application/pdf", b"%PDF-1.4", MAX_UPLOAD_SIZE_BYTES as u64);
        assert!(result.allowed);
    }

    #[test]
    fn test_allows_plain_text() {
        let result = validate_upload("text/plain", b"hello world", MAX_UPLOAD_SIZE_BYTES as u64);
        assert!(result.allowed);
    }

    #[test]
    fn test_rejects_disallowed_mime() {
        let result = validate_upload("video/mp4", b"....ftypmp42", MAX_UPLOAD_SIZE_BYTES as u64);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("not allowed"));
    }

    #[test]
    fn test_rejects_malformed_mime() {
        for mime in ["", "image", "image/", "/png", "image/png/extra", "im age/png"] {
            let result = validate_upload(mime, b"data", MAX_UPLOAD_SIZE_BYTES as u64);
            assert!(!result.allowed, "MIME '{}' should be rejected", mime);
        }
    }

    #[test]
    fn test_rejects_oversized_before_anything_else() {
        let data = vec![0u8; 101];
        let result = validate_upload("text/plain", &data, 100);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("too large"));
    }

    #[test]
    fn test_size_boundary_at_limit() {
        let limit = MAX_UPLOAD_SIZE_BYTES as u64;

        let data_at_limit = vec![b'A'; MAX_UPLOAD_SIZE_BYTES];
        let result = validate_upload("text/plain", &data_at_limit, limit);
        assert!(result.allowed, "file exactly at the cap should be allowed");

        let data_over_limit = vec![b'A'; MAX_UPLOAD_SIZE_BYTES + 1];
        let result = validate_upload("text/plain", &data_over_limit, limit);
        assert!(!result.allowed, "one byte over the cap should be blocked");
    }

    #[test]
    fn test_rejects_pe_disguised_as_text() {
        let result = validate_upload("text/plain", b"MZ\x90\x00", MAX_UPLOAD_SIZE_BYTES as u64);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("Windows PE"));
    }

    #[test]
    fn test_rejects_elf_disguised_as_pdf() {
        let result = validate_upload(
            "application/pdf",
            b"\x7FELF\x02\x01\x01",
            MAX_UPLOAD_SIZE_BYTES as u64,
        );
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("ELF"));
    }

    #[test]
    fn test_rejects_wasm() {
        let result = validate_upload(
            "text/plain",
            &[0x00, 0x61, 0x73, 0x6D, 0x01],
            MAX_UPLOAD_SIZE_BYTES as u64,
        );
        assert!(!result.allowed);
    }

    #[test]
    fn test_allowed_list_matches_office_types() {
        assert!(is_allowed_mime_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(is_allowed_mime_type("application/vnd.ms-powerpoint"));
        assert!(!is_allowed_mime_type("application/zip"));
        assert!(!is_allowed_mime_type("text/html"));
    }

    #[test]
    fn test_sanitize_removes_path() {
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(
            sanitize_filename("C:\\Windows\\system32.dll"),
            "system32.dll"
        );
    }

    #[test]
    fn test_sanitize_removes_dangerous_chars() {
        assert_eq!(sanitize_filename("file<>:test.txt"), "file___test.txt");
        assert_eq!(sanitize_filename("file|name?.txt"), "file_name_.txt");
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long_name = format!("{}.txt", "a".repeat(300));
        let sanitized = sanitize_filename(&long_name);
        assert!(sanitized.len() <= 255);
        assert!(sanitized.ends_with(".txt"));
    }

    #[test]
    fn test_sanitize_handles_empty() {
        assert_eq!(sanitize_filename(""), "unnamed_file");
        assert_eq!(sanitize_filename("   "), "unnamed_file");
    }
}
