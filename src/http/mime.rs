//! MIME type detection module
//!
//! Maps file extensions to Content-Type values through a static table, with
//! content sniffing of the first bytes as a fallback for unknown extensions.

/// Number of leading bytes inspected when sniffing an unknown file type
pub const SNIFF_LEN: usize = 512;

/// Get MIME Content-Type based on file extension
///
/// Returns `None` for unknown or absent extensions so the caller can fall
/// back to [`sniff_content_type`].
///
/// # Examples
/// ```
/// use staticserve::http::mime::from_extension;
/// assert_eq!(from_extension(Some("html")), Some("text/html; charset=utf-8"));
/// assert_eq!(from_extension(Some("mp4")), Some("video/mp4"));
/// assert_eq!(from_extension(None), None);
/// ```
pub fn from_extension(extension: Option<&str>) -> Option<&'static str> {
    match extension {
        // Text
        Some("html" | "htm") => Some("text/html; charset=utf-8"),
        Some("css") => Some("text/css"),
        Some("txt" | "md") => Some("text/plain; charset=utf-8"),
        Some("xml") => Some("application/xml"),

        // JavaScript/WASM
        Some("js" | "mjs") => Some("application/javascript"),
        Some("json") => Some("application/json"),
        Some("wasm") => Some("application/wasm"),

        // Images
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("ico") => Some("image/x-icon"),
        Some("webp") => Some("image/webp"),

        // Video
        Some("mp4") => Some("video/mp4"),
        Some("webm") => Some("video/webm"),
        Some("ogg" | "ogv") => Some("video/ogg"),
        Some("mov") => Some("video/quicktime"),
        Some("avi") => Some("video/x-msvideo"),

        // Audio
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("flac") => Some("audio/flac"),
        Some("m4a") => Some("audio/mp4"),

        // Fonts
        Some("woff") => Some("font/woff"),
        Some("woff2") => Some("font/woff2"),
        Some("ttf") => Some("font/ttf"),
        Some("otf") => Some("font/otf"),
        Some("eot") => Some("application/vnd.ms-fontobject"),

        // Documents
        Some("pdf") => Some("application/pdf"),
        Some("zip") => Some("application/zip"),
        Some("gz" | "gzip") => Some("application/gzip"),
        Some("tar") => Some("application/x-tar"),

        _ => None,
    }
}

/// Sniff a Content-Type from the first bytes of a file.
///
/// Checks magic numbers of common binary formats, then markup prefixes,
/// then a plain-text heuristic. Inconclusive input yields
/// `application/octet-stream`.
pub fn sniff_content_type(head: &[u8]) -> &'static str {
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if head.starts_with(b"\xFF\xD8\xFF") {
        return "image/jpeg";
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
        return "image/webp";
    }
    if head.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if head.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    if head.starts_with(b"\x1F\x8B") {
        return "application/gzip";
    }

    let trimmed = trim_ascii_start(head);
    if starts_with_ignore_case(trimmed, b"<?xml") {
        return "application/xml";
    }
    if starts_with_ignore_case(trimmed, b"<!doctype html")
        || starts_with_ignore_case(trimmed, b"<html")
    {
        return "text/html; charset=utf-8";
    }

    if !head.is_empty() && looks_like_text(head) {
        return "text/plain; charset=utf-8";
    }

    "application/octet-stream"
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let mut rest = bytes;
    while let [first, tail @ ..] = rest {
        if first.is_ascii_whitespace() {
            rest = tail;
        } else {
            break;
        }
    }
    rest
}

fn starts_with_ignore_case(bytes: &[u8], prefix: &[u8]) -> bool {
    bytes.len() >= prefix.len()
        && bytes
            .iter()
            .zip(prefix)
            .all(|(b, p)| b.eq_ignore_ascii_case(p))
}

/// Control bytes other than tab/newline/form-feed/carriage-return mark the
/// content as binary. Bytes >= 0x80 are allowed (UTF-8 continuation).
fn looks_like_text(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r'))
}
