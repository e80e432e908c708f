//! HTTP Range request parsing module
//!
//! Single byte-range support (RFC 9110 §14) for partial downloads of served
//! files.

use std::ops::RangeInclusive;

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum ByteRange {
    /// Satisfiable range, inclusive on both ends
    Satisfiable(RangeInclusive<usize>),
    /// Range lies outside the file - should return 416
    NotSatisfiable,
    /// No Range header, unsupported unit, multi-range or malformed
    /// (ignored, full content is returned)
    Ignored,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end`
/// - `bytes=start-`
/// - `bytes=-suffix` (last `suffix` bytes)
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> ByteRange {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Ignored;
    };

    if spec.contains(',') {
        return ByteRange::Ignored;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return ByteRange::Ignored;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return suffix_range(end_str, file_size);
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return ByteRange::Ignored;
    };

    let end = if end_str.is_empty() {
        None
    } else {
        match end_str.parse::<usize>() {
            Ok(e) => Some(e),
            Err(_) => return ByteRange::Ignored,
        }
    };

    if start >= file_size {
        return ByteRange::NotSatisfiable;
    }

    let last = file_size - 1;
    match end {
        Some(e) if e < start => ByteRange::Ignored,
        Some(e) => ByteRange::Satisfiable(start..=e.min(last)),
        None => ByteRange::Satisfiable(start..=last),
    }
}

fn suffix_range(suffix_str: &str, file_size: usize) -> ByteRange {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return ByteRange::Ignored;
    };

    if suffix == 0 || file_size == 0 {
        return ByteRange::NotSatisfiable;
    }

    // A suffix longer than the file selects the whole file
    ByteRange::Satisfiable(file_size.saturating_sub(suffix)..=file_size - 1)
}
