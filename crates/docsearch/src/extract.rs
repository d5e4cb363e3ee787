//! Plain-text extraction for ingestion.
//!
//! Extraction never fails the command: anything that goes wrong yields an
//! empty string, and ingesting an empty string indexes nothing.

use std::path::Path;
use tracing::warn;

/// Read a file as UTF-8 text, decoding lossily when the bytes are not
/// valid UTF-8. Returns an empty string if the file cannot be read.
pub fn extract_text(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!("{} is not valid UTF-8; decoding lossily", path.display());
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        },
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "plain text with unicode: héllo").unwrap();

        assert_eq!(extract_text(&path), "plain text with unicode: héllo");
    }

    #[test]
    fn invalid_utf8_decodes_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        // "café" in Latin-1: the 0xE9 byte is invalid UTF-8
        std::fs::write(&path, b"caf\xe9 culture").unwrap();

        let text = extract_text(&path);
        assert!(text.starts_with("caf"));
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with("culture"));
    }

    #[test]
    fn missing_file_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");

        assert_eq!(extract_text(&path), "");
    }
}
