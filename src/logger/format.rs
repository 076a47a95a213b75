//! Access log format module
//!
//! Supports two formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//!
//! Combined is CLF with the referer and user agent appended, so both
//! renderings share the same prefix.

use chrono::Local;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, HEAD, etc.)
    pub method: String,
    /// Request URI path
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: u64,
    /// Referer header
    pub referer: Option<String>,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Format the log entry according to the specified format.
    /// Unknown format names fall back to `combined`.
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.common_prefix(),
            _ => self.format_combined(),
        }
    }

    /// `"$method $path?$query HTTP/$version"` as it appears between quotes
    fn request_line(&self) -> String {
        let query = self
            .query
            .as_ref()
            .map(|q| format!("?{q}"))
            .unwrap_or_default();
        format!(
            "{} {}{} HTTP/{}",
            self.method, self.path, query, self.http_version
        )
    }

    /// Common Log Format:
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn common_prefix(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Combined format: CLF plus `"$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.common_prefix(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AccessLogEntry {
        AccessLogEntry {
            remote_addr: "127.0.0.1".to_string(),
            time: Local::now(),
            method: "GET".to_string(),
            path: "/a.txt".to_string(),
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 2,
            referer: None,
            user_agent: Some("curl/8.0".to_string()),
            request_time_us: 1500,
        }
    }

    #[test]
    fn test_combined_format() {
        let line = sample().format("combined");
        assert!(line.starts_with("127.0.0.1 - - ["));
        assert!(line.contains("\"GET /a.txt HTTP/1.1\" 200 2"));
        assert!(line.ends_with("\"-\" \"curl/8.0\""));
    }

    #[test]
    fn test_common_format() {
        let line = sample().format("common");
        assert!(line.contains("\"GET /a.txt HTTP/1.1\" 200 2"));
        assert!(!line.contains("curl"));
    }

    #[test]
    fn test_combined_extends_common() {
        let entry = sample();
        assert!(entry.format("combined").starts_with(&entry.format("common")));
    }

    #[test]
    fn test_query_included() {
        let mut entry = sample();
        entry.query = Some("k=v".to_string());
        assert!(entry.format("common").contains("\"GET /a.txt?k=v HTTP/1.1\""));
    }

    #[test]
    fn test_unknown_format_falls_back() {
        let entry = sample();
        assert_eq!(entry.format("nonsense"), entry.format("combined"));
    }
}
