//! HTTP cache control module
//!
//! Provides `ETag` generation from file metadata and conditional request
//! handling (`If-None-Match`, `If-Modified-Since`).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime};

/// Generate an `ETag` from file size and modification time
///
/// The token changes whenever the file is rewritten or truncated, without
/// reading the content.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn file_etag(size: u64, modified: Option<SystemTime>) -> String {
    let mut hasher = DefaultHasher::new();
    size.hash(&mut hasher);
    if let Some(modified) = modified {
        if let Ok(elapsed) = modified.duration_since(SystemTime::UNIX_EPOCH) {
            elapsed.as_secs().hash(&mut hasher);
            elapsed.subsec_nanos().hash(&mut hasher);
        }
    }
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        // Handle multiple ETags separated by comma
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Check whether the file is unchanged since the client's
/// `If-Modified-Since` timestamp.
///
/// HTTP dates carry second resolution, so the modification time is
/// truncated to seconds before comparing. Unparseable header values are
/// ignored (no 304).
pub fn check_not_modified_since(
    if_modified_since: Option<&str>,
    modified: Option<SystemTime>,
) -> bool {
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Ok(since) = httpdate::parse_http_date(header.trim()) else {
        return false;
    };
    match modified.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(elapsed) => {
            let truncated = SystemTime::UNIX_EPOCH + Duration::from_secs(elapsed.as_secs());
            truncated <= since
        }
        Err(_) => false,
    }
}

/// Decide whether a 304 Not Modified response applies.
///
/// `If-None-Match` takes precedence over `If-Modified-Since`: when the
/// client sent an `ETag`, the date check is skipped entirely.
pub fn not_modified(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: &str,
    modified: Option<SystemTime>,
) -> bool {
    if if_none_match.is_some() {
        return check_etag_match(if_none_match, etag);
    }
    check_not_modified_since(if_modified_since, modified)
}

/// Format a modification time as an HTTP-date for the Last-Modified header
pub fn format_last_modified(modified: SystemTime) -> String {
    httpdate::fmt_http_date(modified)
}
