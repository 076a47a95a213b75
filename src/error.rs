//! Error types for request handling
//!
//! Every request-level failure maps to exactly one HTTP status code.
//! None of these errors is fatal to the listener; they are converted to
//! plain-text responses at the routing layer.

use std::io;
use thiserror::Error;

/// Request handling error
#[derive(Debug, Error)]
pub enum ServeError {
    /// Path escapes the served directory, or access was denied
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No such file or directory, or base path mismatch
    #[error("not found")]
    NotFound,

    /// Method other than GET/HEAD
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Range start lies beyond the end of the file; carries the file size
    /// so the 416 response can include `Content-Range: bytes */size`
    #[error("range not satisfiable for size {0}")]
    RangeNotSatisfiable(u64),

    /// Malformed request input (bad percent-encoding, NUL in path)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unexpected I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ServeError {
    /// HTTP status code for this error
    pub fn status(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::RangeNotSatisfiable(_) => 416,
            Self::BadRequest(_) => 400,
            Self::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => 404,
                io::ErrorKind::PermissionDenied => 403,
                _ => 500,
            },
        }
    }

    /// Canonical reason phrase for the mapped status code
    pub fn status_text(&self) -> &'static str {
        match self.status() {
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            416 => "Range Not Satisfiable",
            _ => "Internal Server Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServeError::Forbidden("x".into()).status(), 403);
        assert_eq!(ServeError::NotFound.status(), 404);
        assert_eq!(ServeError::MethodNotAllowed("POST".into()).status(), 405);
        assert_eq!(ServeError::RangeNotSatisfiable(10).status(), 416);
        assert_eq!(ServeError::BadRequest("x".into()).status(), 400);
    }

    #[test]
    fn test_io_kind_mapping() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(ServeError::Io(not_found).status(), 404);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        assert_eq!(ServeError::Io(denied).status(), 403);

        let other = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(ServeError::Io(other).status(), 500);
    }
}
