//! Static file serving module
//!
//! Resolves GET/HEAD paths under the served root and builds file,
//! directory-listing, redirect and error responses.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::path::percent_decode_utf8;
use crate::http::response::{self as builders, Validators};
use crate::http::{self, cache, mime, ByteRange};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a GET/HEAD request from the served root
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let Some(fs_path) = resolve_path(&state.serve_root, ctx.path) else {
        return http::build_404_response();
    };

    let metadata = match fs::metadata(&fs_path).await {
        Ok(m) => m,
        Err(e) => return lookup_error_response(&e, &fs_path),
    };

    if !is_within_root(&fs_path, &state.serve_root).await {
        logger::log_warning(&format!(
            "Path escapes served root, refusing: {}",
            ctx.path
        ));
        return http::build_404_response();
    }

    if metadata.is_dir() {
        serve_directory(ctx, state, &fs_path).await
    } else if ctx.path.ends_with('/') {
        // A file addressed like a directory
        http::build_404_response()
    } else {
        serve_file(ctx, &fs_path, &metadata).await
    }
}

/// Map a URL path to a filesystem path under `root`
///
/// The path is percent-decoded and empty, `.` and `..` segments are
/// dropped, so the result never names anything above `root` lexically.
/// Returns `None` for paths that do not decode to UTF-8.
pub fn resolve_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_utf8(url_path)?;
    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        if segment.contains(['\\', '\0']) {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

/// Symlinks may still point outside the root; compare canonical paths
async fn is_within_root(path: &Path, root: &Path) -> bool {
    fs::canonicalize(path)
        .await
        .is_ok_and(|canonical| canonical.starts_with(root))
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_redirect_response(&location);
    }

    for index_file in &state.config.storage.index_files {
        let index_path = dir.join(index_file);
        if let Ok(metadata) = fs::metadata(&index_path).await {
            if metadata.is_file() {
                return serve_file(ctx, &index_path, &metadata).await;
            }
        }
    }

    if !state.config.storage.directory_listing {
        return http::build_403_response();
    }

    match listing::read_entries(dir).await {
        Ok(entries) => {
            let url_path = percent_decode_utf8(ctx.path).unwrap_or_else(|| ctx.path.to_string());
            builders::build_html_response(listing::render_listing(&url_path, &entries), ctx.is_head)
        }
        Err(e) => lookup_error_response(&e, dir),
    }
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    metadata: &Metadata,
) -> Response<Full<Bytes>> {
    let data = match fs::read(path).await {
        Ok(d) => Bytes::from(d),
        Err(e) => return lookup_error_response(&e, path),
    };

    let content_type = mime::content_type_for(path);
    let etag = cache::generate_etag(&data);
    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);
    let validators = Validators {
        etag: &etag,
        last_modified: last_modified.as_deref(),
    };

    // If-Modified-Since only applies when no entity tag was sent
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match, &etag)
    } else {
        modified.is_some_and(|m| cache::not_modified_since(ctx.if_modified_since, m))
    };
    if not_modified {
        return builders::build_304_response(&validators);
    }

    match http::parse_range_header(ctx.range_header, data.len()) {
        ByteRange::Satisfiable(range) => {
            builders::build_partial_response(&data, range, content_type, &validators, ctx.is_head)
        }
        ByteRange::NotSatisfiable => builders::build_416_response(data.len()),
        ByteRange::Ignored => {
            builders::build_file_response(data, content_type, &validators, ctx.is_head)
        }
    }
}

fn lookup_error_response(error: &io::Error, path: &Path) -> Response<Full<Bytes>> {
    match error.kind() {
        io::ErrorKind::NotFound => http::build_404_response(),
        io::ErrorKind::PermissionDenied => {
            logger::log_warning(&format!("Permission denied: {}", path.display()));
            http::build_403_response()
        }
        _ => {
            logger::log_error(&format!("Failed to read '{}': {error}", path.display()));
            http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}
