//! MIME type detection module
//!
//! Maps a file extension to a Content-Type, case-insensitively.

use std::path::Path;

const FALLBACK: &str = "application/octet-stream";

/// Content-Type for a file path, `application/octet-stream` when unknown
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(FALLBACK, |ext| content_type(&ext.to_ascii_lowercase()))
}

/// Content-Type for a lowercase extension without the leading dot
pub fn content_type(extension: &str) -> &'static str {
    match extension {
        // Text and source
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" | "log" | "ini" | "conf" | "rs" | "py" | "c" | "h" | "toml" | "yaml"
        | "yml" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "sh" => "application/x-sh",
        "xml" => "application/xml",

        // JavaScript/WASM/data
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "bmp" => "image/bmp",

        // Audio/video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "ogv" => "video/ogg",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Documents and archives
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "bz2" => "application/x-bzip2",
        "xz" => "application/x-xz",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",

        _ => FALLBACK,
    }
}
