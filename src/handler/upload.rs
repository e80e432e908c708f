//! Upload handler module
//!
//! `POST /<path>/<name>` stores exactly `Content-Length` body bytes as
//! `<name>` in the write root. The body is streamed into a hidden partial
//! file which is renamed over the target only once every declared byte has
//! arrived and been synced, so a failed upload leaves the previous version
//! of the file untouched.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use http_body_util::BodyExt;
use hyper::body::{Bytes, Frame, Incoming};
use hyper::header::CONTENT_LENGTH;
use hyper::{HeaderMap, Request, StatusCode};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::filename::{derive_upload_name, FilenameError};
use crate::config::AppState;

/// Prefix of in-progress upload files (hidden from directory listings)
pub const PARTIAL_PREFIX: &str = ".filedrop-";
const PARTIAL_SUFFIX: &str = ".part";

/// A completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedUpload {
    pub name: String,
    pub bytes: u64,
}

/// Why an upload was not saved
#[derive(Debug)]
pub enum UploadError {
    Filename(FilenameError),
    MissingContentLength,
    InvalidContentLength(String),
    TooLarge { declared: u64, limit: u64 },
    /// Body ended before the declared length
    Incomplete { expected: u64, received: u64 },
    /// No body data within the read timeout
    Timeout(Duration),
    /// Connection failed while reading the body
    Transport(hyper::Error),
    /// Write root could not be written
    Storage(io::Error),
}

impl UploadError {
    /// HTTP status reported to the client
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Filename(_)
            | Self::MissingContentLength
            | Self::InvalidContentLength(_)
            | Self::Incomplete { .. }
            | Self::Transport(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Storage(e) => match e.kind() {
                io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                io::ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Caused by the request rather than by the server
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filename(e) => write!(f, "{e}"),
            Self::MissingContentLength => write!(f, "missing Content-Length header"),
            Self::InvalidContentLength(value) => {
                write!(f, "invalid Content-Length value '{value}'")
            }
            Self::TooLarge { declared, limit } => {
                write!(f, "upload of {declared} bytes exceeds the {limit} byte limit")
            }
            Self::Incomplete { expected, received } => {
                write!(f, "body ended after {received} of {expected} bytes")
            }
            Self::Timeout(after) => {
                write!(f, "no body data received for {} seconds", after.as_secs())
            }
            Self::Transport(e) => write!(f, "failed to read request body: {e}"),
            Self::Storage(e) => write!(f, "failed to store file: {e}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filename(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FilenameError> for UploadError {
    fn from(e: FilenameError) -> Self {
        Self::Filename(e)
    }
}

/// Parse the declared body length
pub fn declared_length(headers: &HeaderMap) -> Result<u64, UploadError> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or(UploadError::MissingContentLength)?;
    let text = value.to_str().map_err(|_| {
        UploadError::InvalidContentLength(String::from_utf8_lossy(value.as_bytes()).into_owned())
    })?;
    text.trim()
        .parse::<u64>()
        .map_err(|_| UploadError::InvalidContentLength(text.to_string()))
}

/// True for the hidden files used while an upload is in flight
pub fn is_partial_upload(name: &str) -> bool {
    name.starts_with(PARTIAL_PREFIX) && name.ends_with(PARTIAL_SUFFIX)
}

fn partial_name(seq: u64) -> String {
    format!("{PARTIAL_PREFIX}{}-{seq}{PARTIAL_SUFFIX}", std::process::id())
}

/// Save the request body under the name derived from the request path
pub async fn handle_upload(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<SavedUpload, UploadError> {
    let name = derive_upload_name(req.uri().path())?;
    let expected = declared_length(req.headers())?;

    let limit = state.config.http.max_body_size;
    if expected > limit {
        return Err(UploadError::TooLarge {
            declared: expected,
            limit,
        });
    }

    let target = state.upload_root.join(&name);
    let partial = state.upload_root.join(partial_name(state.next_upload_seq()));
    let mut body = req.into_body();

    // Never reuse an existing file as the staging area
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&partial)
        .await
        .map_err(UploadError::Storage)?;

    let result = match write_partial(file, &mut body, expected, state.read_timeout()).await {
        Ok(bytes) => fs::rename(&partial, &target)
            .await
            .map(|()| bytes)
            .map_err(UploadError::Storage),
        Err(e) => Err(e),
    };

    match result {
        Ok(bytes) => Ok(SavedUpload { name, bytes }),
        Err(e) => {
            discard_partial(&partial).await;
            Err(e)
        }
    }
}

async fn write_partial(
    mut file: File,
    body: &mut Incoming,
    expected: u64,
    read_timeout: Duration,
) -> Result<u64, UploadError> {
    let mut received: u64 = 0;

    while let Some(frame) = next_frame(body, read_timeout).await? {
        // Trailers carry no file content
        let Ok(data) = frame.into_data() else {
            continue;
        };
        received += u64::try_from(data.len()).unwrap_or(u64::MAX);
        if received > expected {
            return Err(UploadError::InvalidContentLength(expected.to_string()));
        }
        file.write_all(&data).await.map_err(UploadError::Storage)?;
    }

    if received != expected {
        return Err(UploadError::Incomplete { expected, received });
    }

    file.flush().await.map_err(UploadError::Storage)?;
    file.sync_all().await.map_err(UploadError::Storage)?;
    Ok(received)
}

async fn next_frame(
    body: &mut Incoming,
    read_timeout: Duration,
) -> Result<Option<Frame<Bytes>>, UploadError> {
    match tokio::time::timeout(read_timeout, body.frame()).await {
        Err(_) => Err(UploadError::Timeout(read_timeout)),
        Ok(None) => Ok(None),
        Ok(Some(Ok(frame))) => Ok(Some(frame)),
        Ok(Some(Err(e))) => Err(UploadError::Transport(e)),
    }
}

async fn discard_partial(partial: &Path) {
    match fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => crate::logger::log_warning(&format!(
            "Failed to remove partial upload '{}': {e}",
            partial.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn headers_with_length(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length(&headers_with_length("11")).unwrap(), 11);
        assert_eq!(declared_length(&headers_with_length("0")).unwrap(), 0);
    }

    #[test]
    fn test_missing_length_is_bad_request() {
        let err = declared_length(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, UploadError::MissingContentLength));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_non_numeric_length_is_bad_request() {
        for value in ["abc", "-1", "1.5", ""] {
            let err = declared_length(&headers_with_length(value)).unwrap_err();
            assert!(matches!(err, UploadError::InvalidContentLength(_)), "{value}");
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            UploadError::from(FilenameError::Empty).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UploadError::TooLarge { declared: 10, limit: 5 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            UploadError::Incomplete { expected: 10, received: 3 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UploadError::Timeout(Duration::from_secs(1)).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            UploadError::Storage(io::Error::from(io::ErrorKind::PermissionDenied)).status(),
            StatusCode::FORBIDDEN
        );
        let disk_full = UploadError::Storage(io::Error::other("no space left on device"));
        assert_eq!(disk_full.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!disk_full.is_client_error());
    }

    #[test]
    fn test_partial_names_are_recognised() {
        assert_eq!(partial_name(7), format!(".filedrop-{}-7.part", std::process::id()));
        assert!(is_partial_upload(&partial_name(7)));
        assert!(!is_partial_upload("notes.txt"));
        assert!(!is_partial_upload(".filedrop-config"));
    }
}
