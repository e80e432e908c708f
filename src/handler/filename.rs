//! Upload filename normalization
//!
//! A POST target is reduced to its final path segment, percent-decoded,
//! and checked against a short list of names that cannot be stored as a
//! plain file in the write root. Uploads therefore never reach a
//! subdirectory or a parent directory.

use std::fmt;

use super::upload::is_partial_upload;
use crate::http::path::percent_decode_utf8;

/// Longest accepted name in bytes (common filesystem limit)
pub const MAX_NAME_LEN: usize = 255;

/// Why a request path does not yield a usable upload name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    /// Path ends in `/`, e.g. `POST /` or `POST /dir/`
    Empty,
    /// `.`, `..` or the name pattern of an in-progress upload
    Reserved(String),
    /// Decoded name contains `/`, `\` or NUL
    InvalidCharacter(String),
    /// Decoded bytes are not UTF-8
    NotUtf8,
    /// Longer than [`MAX_NAME_LEN`] bytes
    TooLong(usize),
}

impl fmt::Display for FilenameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "request path has no file name"),
            Self::Reserved(name) => write!(f, "reserved file name '{name}'"),
            Self::InvalidCharacter(name) => {
                write!(f, "file name '{}' contains a path separator or NUL", name.escape_debug())
            }
            Self::NotUtf8 => write!(f, "file name is not valid UTF-8"),
            Self::TooLong(len) => write!(f, "file name is {len} bytes, limit is {MAX_NAME_LEN}"),
        }
    }
}

impl std::error::Error for FilenameError {}

/// Derive the upload file name from a request path (query already removed)
///
/// `/a/b/report.txt` becomes `report.txt`; `/my%20notes.txt` becomes
/// `my notes.txt`.
pub fn derive_upload_name(path: &str) -> Result<String, FilenameError> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    if segment.is_empty() {
        return Err(FilenameError::Empty);
    }

    let name = percent_decode_utf8(segment).ok_or(FilenameError::NotUtf8)?;

    if name.is_empty() {
        return Err(FilenameError::Empty);
    }
    if name == "." || name == ".." || is_partial_upload(&name) {
        return Err(FilenameError::Reserved(name));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(FilenameError::InvalidCharacter(name));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FilenameError::TooLong(name.len()));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment_only() {
        assert_eq!(derive_upload_name("/notes.txt").unwrap(), "notes.txt");
        assert_eq!(derive_upload_name("/a/b/report.txt").unwrap(), "report.txt");
        assert_eq!(derive_upload_name("/../../etc/passwd").unwrap(), "passwd");
    }

    #[test]
    fn test_empty_names() {
        assert_eq!(derive_upload_name("/"), Err(FilenameError::Empty));
        assert_eq!(derive_upload_name("/uploads/"), Err(FilenameError::Empty));
        assert_eq!(derive_upload_name(""), Err(FilenameError::Empty));
    }

    #[test]
    fn test_dot_names_are_reserved() {
        assert_eq!(
            derive_upload_name("/a/.."),
            Err(FilenameError::Reserved("..".to_string()))
        );
        assert_eq!(
            derive_upload_name("/%2E"),
            Err(FilenameError::Reserved(".".to_string()))
        );
    }

    #[test]
    fn test_partial_upload_names_are_reserved() {
        let name = format!(".filedrop-{}-1.part", std::process::id());
        assert_eq!(
            derive_upload_name(&format!("/{name}")),
            Err(FilenameError::Reserved(name))
        );
        assert_eq!(derive_upload_name("/.filedrop-notes").unwrap(), ".filedrop-notes");
    }

    #[test]
    fn test_decoded_separators_rejected() {
        assert!(matches!(
            derive_upload_name("/..%2Fescape.txt"),
            Err(FilenameError::InvalidCharacter(_))
        ));
        assert!(matches!(
            derive_upload_name("/dir%5Cfile"),
            Err(FilenameError::InvalidCharacter(_))
        ));
        assert!(matches!(
            derive_upload_name("/nul%00byte"),
            Err(FilenameError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(derive_upload_name("/my%20notes.txt").unwrap(), "my notes.txt");
        assert_eq!(derive_upload_name("/100%.txt").unwrap(), "100%.txt");
        assert_eq!(derive_upload_name("/%FF"), Err(FilenameError::NotUtf8));
    }

    #[test]
    fn test_length_limit() {
        let ok = format!("/{}", "a".repeat(MAX_NAME_LEN));
        let long = format!("/{}", "a".repeat(MAX_NAME_LEN + 1));
        assert!(derive_upload_name(&ok).is_ok());
        assert_eq!(
            derive_upload_name(&long),
            Err(FilenameError::TooLong(MAX_NAME_LEN + 1))
        );
    }
}
