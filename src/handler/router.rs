//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method dispatch, central
//! error-to-status mapping, `Server` header and access logging.

use crate::config::AppState;
use crate::handler::{static_files, upload};
use crate::http::{self, response};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, REFERER, SERVER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context for static serving, borrowed from the request head
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    fn from_parts(parts: &'a Parts) -> Self {
        let header = move |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            range_header: header("range"),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut entry = access_entry(&req, peer_addr);

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let method = req.method().clone();
    let mut response = match method {
        Method::GET | Method::HEAD => {
            let (parts, _body) = req.into_parts();
            let ctx = RequestContext::from_parts(&parts);
            static_files::serve(&ctx, &state).await
        }
        Method::POST => match upload::handle_upload(req, &state).await {
            Ok(saved) => {
                logger::log_upload_saved(&saved.name, saved.bytes, &peer_addr);
                response::build_created_response(&saved.name)
            }
            Err(e) => upload_error_response(&e, &entry.path),
        },
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn upload_error_response(error: &upload::UploadError, path: &str) -> Response<Full<Bytes>> {
    if error.is_client_error() {
        logger::log_warning(&format!("Upload to {path} rejected: {error}"));
    } else {
        logger::log_error(&format!("Upload to {path} failed: {error}"));
    }
    http::build_error_response(error.status(), &error.to_string())
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(req, REFERER.as_str());
    entry.user_agent = header_string(req, USER_AGENT.as_str());
    entry
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
