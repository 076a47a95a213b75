//! HTTP Range header parsing
//!
//! Single-range `bytes=` requests for resumable downloads. Multi-range
//! requests and non-byte units are ignored rather than rejected, so the
//! server falls back to a full 200 response for them.

/// Parsed Range request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    /// First byte position
    pub start: u64,
    /// Last byte position; `None` means through the end of the file
    pub end: Option<u64>,
}

impl RangeRequest {
    /// Last byte position actually served, given the file size
    #[inline]
    pub fn end_position(&self, file_size: u64) -> u64 {
        self.end.unwrap_or_else(|| file_size.saturating_sub(1))
    }

    /// Number of bytes covered by the range
    pub fn byte_count(&self, file_size: u64) -> u64 {
        self.end_position(file_size).saturating_sub(self.start) + 1
    }
}

/// Range header parse result
#[derive(Debug)]
pub enum RangeParseResult {
    /// Usable range; serve 206
    Valid(RangeRequest),
    /// Syntactically fine but lies beyond the file; serve 416
    NotSatisfiable,
    /// Header absent or malformed; serve the full file
    None,
}

/// One side of a `start-end` byte-range spec
enum Bound {
    Absent,
    At(u64),
    Malformed,
}

fn parse_bound(s: &str) -> Bound {
    let s = s.trim();
    if s.is_empty() {
        return Bound::Absent;
    }
    s.parse::<u64>().map_or(Bound::Malformed, Bound::At)
}

/// Parse an HTTP Range header value against a known file size.
///
/// Accepted forms: `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
/// An end position past the file is clamped; a start position past the
/// file is unsatisfiable; anything else that fails to parse is treated as
/// if no Range header had been sent.
///
/// # Examples
/// ```
/// use staticserve::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert!(matches!(result, RangeParseResult::Valid(_)));
///
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };

    // Multi-range responses need multipart bodies; treat them as unranged
    if spec.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start, end)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };

    match (parse_bound(start), parse_bound(end)) {
        (Bound::Absent, Bound::At(suffix)) => suffix_range(suffix, file_size),
        (Bound::At(start), Bound::Absent) => bounded_range(start, None, file_size),
        (Bound::At(start), Bound::At(end)) => bounded_range(start, Some(end), file_size),
        _ => RangeParseResult::None,
    }
}

/// `-suffix`: the last `suffix` bytes of the file
fn suffix_range(suffix: u64, file_size: u64) -> RangeParseResult {
    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }
    // A suffix longer than the file covers the whole file
    RangeParseResult::Valid(RangeRequest {
        start: file_size.saturating_sub(suffix),
        end: Some(file_size - 1),
    })
}

/// `start-` or `start-end`
fn bounded_range(start: u64, end: Option<u64>, file_size: u64) -> RangeParseResult {
    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }
    if let Some(end) = end {
        // An inverted range is invalid, not unsatisfiable (RFC 9110 §14.1.1)
        if end < start {
            return RangeParseResult::None;
        }
    }
    RangeParseResult::Valid(RangeRequest {
        start,
        end: end.map(|e| e.min(file_size - 1)),
    })
}
