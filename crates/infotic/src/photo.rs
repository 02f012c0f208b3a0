//! Photo payload handling.
//!
//! Photos travel inside records as base64 `data:` URIs, the same form a
//! browser file reader produces, so a record is self-contained.

use std::path::Path;
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// Number of hex digits kept from the photo digest for display.
const FINGERPRINT_LEN: usize = 12;

fn data_uri_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,").expect("valid data URI pattern")
    })
}

/// Guess an image MIME type from a file extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Encode raw image bytes as a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Read an image file and encode it as a data URI.
///
/// # Errors
///
/// Returns [`Error::InvalidPhoto`] if the extension is not a known image
/// type or the file is empty, and [`Error::Io`] if it cannot be read.
pub fn read_photo(path: &Path) -> Result<String> {
    let mime = mime_for_path(path).ok_or_else(|| {
        Error::invalid_photo(format!("unsupported image type: {}", path.display()))
    })?;

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(Error::invalid_photo(format!(
            "empty file: {}",
            path.display()
        )));
    }

    debug!("Encoded {} ({} bytes, {})", path.display(), bytes.len(), mime);
    Ok(encode_data_uri(mime, &bytes))
}

/// Check that `uri` is a base64 image data URI with a non-empty payload.
///
/// Returns the MIME type on success.
///
/// # Errors
///
/// Returns [`Error::InvalidPhoto`] describing the problem.
pub fn validate_data_uri(uri: &str) -> Result<&str> {
    let captures = data_uri_header()
        .captures(uri)
        .ok_or_else(|| Error::invalid_photo("expected a base64 image data URI"))?;

    let header = captures
        .get(0)
        .ok_or_else(|| Error::internal("data URI header match missing"))?;
    let mime = captures
        .get(1)
        .ok_or_else(|| Error::internal("data URI MIME group missing"))?
        .as_str();

    let payload = &uri[header.end()..];
    if payload.is_empty() {
        return Err(Error::invalid_photo("image payload is empty"));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| Error::invalid_photo(format!("payload is not valid base64: {e}")))?;

    Ok(mime)
}

/// Short, stable fingerprint of a photo payload for listings.
#[must_use]
pub fn fingerprint(photo: &str) -> String {
    let mut hex = blake3::hash(photo.as_bytes()).to_hex().to_string();
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // 1x1 transparent PNG.
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(&PathBuf::from("a.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(&PathBuf::from("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(&PathBuf::from("dir/b.png")), Some("image/png"));
        assert_eq!(mime_for_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(mime_for_path(&PathBuf::from("no_extension")), None);
    }

    #[test]
    fn test_encode_data_uri() {
        assert_eq!(encode_data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn test_validate_accepts_encoded_photo() {
        let uri = encode_data_uri("image/png", PNG_BYTES);
        assert_eq!(validate_data_uri(&uri).unwrap(), "image/png");
    }

    #[test]
    fn test_validate_rejects_non_image() {
        let err = validate_data_uri("data:text/plain;base64,aGk=").unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_validate_rejects_plain_text() {
        assert!(validate_data_uri("just a photo").is_err());
    }

    #[test]
    fn test_validate_rejects_empty_payload() {
        let err = validate_data_uri("data:image/jpeg;base64,").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_rejects_bad_base64() {
        let err = validate_data_uri("data:image/jpeg;base64,@@@").unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_read_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evidence.png");
        std::fs::write(&path, PNG_BYTES).unwrap();

        let uri = read_photo(&path).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(validate_data_uri(&uri).is_ok());
    }

    #[test]
    fn test_read_photo_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(read_photo(&path), Err(Error::InvalidPhoto { .. })));
    }

    #[test]
    fn test_read_photo_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evidence.txt");
        std::fs::write(&path, b"text").unwrap();

        assert!(matches!(read_photo(&path), Err(Error::InvalidPhoto { .. })));
    }

    #[test]
    fn test_read_photo_missing_file() {
        let result = read_photo(Path::new("/nonexistent/evidence.jpg"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_fingerprint() {
        let a = fingerprint("data:image/png;base64,AAAA");
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert_eq!(a, fingerprint("data:image/png;base64,AAAA"));
        assert_ne!(a, fingerprint("data:image/png;base64,BBBB"));
    }
}
