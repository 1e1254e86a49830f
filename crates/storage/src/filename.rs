//! Filename sanitization and generation.
//!
//! Both functions are pure: no I/O, no shared state. Uniqueness of generated
//! names comes from a millisecond timestamp plus a random suffix, so
//! concurrent uploads need no coordination.

use crate::{StorageError, StorageResult};
use chrono::Utc;
use rand::Rng;
use std::path::Path;

/// Longest sanitized basename carried into a generated filename.
const MAX_BASENAME_LEN: usize = 50;

/// Sanitize an original basename for use inside a generated filename.
///
/// Lowercases the input and collapses every run of characters outside
/// `[a-z0-9]` into a single hyphen. Leading and trailing hyphens are dropped
/// and the result is capped at 50 characters. An input with no usable
/// characters sanitizes to `"file"`.
pub fn sanitize_basename(name: &str) -> String {
    let mut out = String::with_capacity(name.len().min(MAX_BASENAME_LEN));
    let mut pending_hyphen = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
        if out.len() >= MAX_BASENAME_LEN {
            break;
        }
    }

    out.truncate(MAX_BASENAME_LEN);
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("file");
    }
    out
}

/// Generate a collision-resistant filename for one upload.
///
/// Shape: `<prefix>-<sanitized-basename>-<timestamp-ms>-<random>[.<ext>]`.
/// The extension is taken from the original name, lowercased, and stripped of
/// anything that is not alphanumeric; it is omitted when the original has
/// none. The result never contains path separators.
pub fn generate_filename(originalname: &str, prefix: &str) -> String {
    let original = Path::new(originalname);
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let base = sanitize_basename(stem);

    let extension: String = original
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    let timestamp = Utc::now().timestamp_millis();
    let random: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    if extension.is_empty() {
        format!("{prefix}-{base}-{timestamp}-{random}")
    } else {
        format!("{prefix}-{base}-{timestamp}-{random}.{extension}")
    }
}

/// Reject caller-supplied filenames that are empty or could traverse outside
/// a category directory.
pub(crate) fn ensure_safe_filename(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidFilename);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_lowercases_and_collapses() {
        assert_eq!(sanitize_basename("My Résumé (final).v2"), "my-r-sum-final-v2");
        assert_eq!(sanitize_basename("photo"), "photo");
        assert_eq!(sanitize_basename("A__B--C"), "a-b-c");
    }

    #[test]
    fn test_sanitize_trims_edge_hyphens() {
        assert_eq!(sanitize_basename("  spaced  "), "spaced");
        assert_eq!(sanitize_basename("---x---"), "x");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_basename(&long).len(), 50);

        // A hyphen landing exactly on the cap must not survive as a trailing hyphen.
        let tricky = format!("{} {}", "a".repeat(49), "b".repeat(20));
        let out = sanitize_basename(&tricky);
        assert!(out.len() <= 50);
        assert!(!out.ends_with('-'));
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_basename(""), "file");
        assert_eq!(sanitize_basename("!!!"), "file");
    }

    #[test]
    fn test_generate_shape() {
        let name = generate_filename("My CV.PDF", "cv");
        assert!(name.starts_with("cv-my-cv-"));
        assert!(name.ends_with(".pdf"));
        assert!(!name.contains('/'));

        let parts: Vec<&str> = name
            .trim_end_matches(".pdf")
            .rsplitn(3, '-')
            .collect();
        assert!(parts[0].parse::<u32>().is_ok(), "random suffix: {name}");
        assert!(parts[1].parse::<i64>().is_ok(), "timestamp: {name}");
    }

    #[test]
    fn test_generate_without_extension() {
        let name = generate_filename("README", "file");
        assert!(name.starts_with("file-readme-"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_generate_is_collision_resistant() {
        let a = generate_filename("photo.png", "avatar");
        let b = generate_filename("photo.png", "avatar");
        assert_ne!(a, b);
    }

    #[test]
    fn test_safe_filename_screening() {
        assert!(ensure_safe_filename("avatar-x-1-2.png").is_ok());
        assert!(matches!(
            ensure_safe_filename("../secret"),
            Err(StorageError::InvalidFilename)
        ));
        assert!(matches!(
            ensure_safe_filename("a/b.png"),
            Err(StorageError::InvalidFilename)
        ));
        assert!(matches!(
            ensure_safe_filename(""),
            Err(StorageError::InvalidFilename)
        ));
    }
}
