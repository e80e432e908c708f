//! HTTP response building module
//!
//! Builders for every status the server emits. Builder failures are logged
//! and replaced with a bare response carrying the same status, so a request
//! never panics while responding.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::ops::RangeInclusive;


/// Files can be replaced by an upload at any time, so caches revalidate
const CACHE_CONTROL: &str = "no-cache";

/// Validators attached to file responses
pub struct Validators<'a> {
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
}

fn bare(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp
}

/// Build a plain-text response for any status, e.g. `404 Not Found\n`
pub fn build_text_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(format!("{message}\n"));
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            bare(status, body)
        })
}

/// Build an error response whose body states the status and a reason
pub fn build_error_response(status: StatusCode, reason: &str) -> Response<Full<Bytes>> {
    let canonical = status.canonical_reason().unwrap_or("Error");
    if reason.is_empty() {
        build_text_response(status, &format!("{} {canonical}", status.as_u16()))
    } else {
        build_text_response(status, &format!("{} {canonical}: {reason}", status.as_u16()))
    }
}

/// Build 201 Created response for a saved upload: `Saved "<name>"\n`
pub fn build_created_response(name: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(format!("Saved \"{name}\"\n"));
    Response::builder()
        .status(StatusCode::CREATED)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("201", &e);
            bare(StatusCode::CREATED, body)
        })
}

/// Build 301 redirect, used to add the trailing slash to directory URLs
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            bare(StatusCode::MOVED_PERMANENTLY, Bytes::new())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "")
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::FORBIDDEN, "")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut resp = build_error_response(StatusCode::METHOD_NOT_ALLOWED, "");
    resp.headers_mut().insert(
        hyper::header::ALLOW,
        hyper::header::HeaderValue::from_static("GET, HEAD, POST"),
    );
    resp
}

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators<'_>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", validators.etag)
        .header("Cache-Control", CACHE_CONTROL);
    if let Some(lm) = validators.last_modified {
        builder = builder.header("Last-Modified", lm);
    }
    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        bare(StatusCode::NOT_MODIFIED, Bytes::new())
    })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    let mut resp = build_error_response(StatusCode::RANGE_NOT_SATISFIABLE, "");
    if let Ok(value) = hyper::header::HeaderValue::from_str(&format!("bytes */{file_size}")) {
        resp.headers_mut().insert(hyper::header::CONTENT_RANGE, value);
    }
    resp
}

/// Build generic HTML response (directory listings)
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            bare(StatusCode::OK, Bytes::new())
        })
}

/// Build 200 response for a whole file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", validators.etag)
        .header("Cache-Control", CACHE_CONTROL);
    if let Some(lm) = validators.last_modified {
        builder = builder.header("Last-Modified", lm);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        bare(StatusCode::OK, Bytes::new())
    })
}

/// Build 206 Partial Content response, `data` is the whole file
pub fn build_partial_response(
    data: &Bytes,
    range: RangeInclusive<usize>,
    content_type: &str,
    validators: &Validators<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let (start, end) = (*range.start(), *range.end());
    let total_size = data.len();
    let content_length = end - start + 1;
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range)
    };

    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", validators.etag)
        .header("Cache-Control", CACHE_CONTROL);
    if let Some(lm) = validators.last_modified {
        builder = builder.header("Last-Modified", lm);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("206", &e);
        bare(StatusCode::PARTIAL_CONTENT, Bytes::new())
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
