//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, base path
//! stripping, path resolution, and dispatch to file or directory serving.

use crate::config::Config;
use crate::error::ServeError;
use crate::handler::resolve::{self, Resolution};
use crate::handler::{listing, static_files};
use crate::http::body::ResponseBody;
use crate::http::response;
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Incoming};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Full request path as received, still percent-encoded
    pub raw_path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    cfg: Arc<Config>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_str(req.version());
    let referer = header_string(&req, "referer");
    let user_agent = header_string(&req, "user-agent");

    // Filesystem work (resolution, open, buffered reads) is bounded by the
    // read timeout; streamed bodies carry their own per-chunk deadline.
    let dispatched = tokio::time::timeout(cfg.performance.read_timeout(), dispatch(&req, &cfg))
        .await
        .unwrap_or_else(|_| {
            Err(ServeError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "request processing timed out",
            )))
        });

    let response = match dispatched {
        Ok(response) => response,
        Err(err) => {
            match &err {
                ServeError::Io(e) => log::error!("{method} {path} failed: {e}"),
                ServeError::Forbidden(reason) => log::warn!("{method} {path}: {reason}"),
                _ => log::debug!("{method} {path}: {err}"),
            }
            response::build_error_response(&err)
        }
    };

    if cfg.logging.access_log {
        let entry = AccessLogEntry {
            remote_addr: peer_addr.ip().to_string(),
            time: chrono::Local::now(),
            method,
            path,
            query,
            http_version,
            status: response.status().as_u16(),
            body_bytes: response.body().size_hint().exact().unwrap_or(0),
            referer,
            user_agent,
            request_time_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        };
        logger::log_access(&entry, &cfg.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch(
    req: &Request<Incoming>,
    cfg: &Config,
) -> Result<Response<ResponseBody>, ServeError> {
    let method = req.method();
    if !matches!(*method, Method::GET | Method::HEAD) {
        return Err(ServeError::MethodNotAllowed(method.to_string()));
    }

    let raw_path = req.uri().path();
    let Some(remainder) = strip_base_path(raw_path, &cfg.server.base_path) else {
        return Err(ServeError::NotFound);
    };

    let ctx = RequestContext {
        raw_path,
        is_head: *method == Method::HEAD,
        if_none_match: header_string(req, "if-none-match"),
        if_modified_since: header_string(req, "if-modified-since"),
        range: header_string(req, "range"),
    };

    match resolve::resolve(&cfg.server.root_dir, remainder).await? {
        Resolution::NotFound => Err(ServeError::NotFound),
        Resolution::Found(target) if target.is_dir => {
            listing::serve_directory(&ctx, cfg, &target.path).await
        }
        Resolution::Found(target) => static_files::serve_file(&ctx, cfg, &target.path).await,
    }
}

/// Strip the configured base path from a request path.
///
/// Returns the remainder (always starting with `/`), or `None` when the
/// request lies outside the base path. `/filesystem` does not match a base
/// path of `/files`.
pub fn strip_base_path<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base == "/" {
        return Some(path);
    }
    match path.strip_prefix(base) {
        Some("") => Some("/"),
        Some(rest) if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

fn header_string(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_str(version: Version) -> String {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string()
}
