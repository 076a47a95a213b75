//! HTTP response building module
//!
//! Provides builders for the status codes this server emits, decoupled
//! from how the payloads are produced.

use crate::error::ServeError;
use crate::http::body::ResponseBody;
use hyper::body::Bytes;
use hyper::Response;

/// Build the response for a failed request
pub fn build_error_response(err: &ServeError) -> Response<ResponseBody> {
    match err {
        ServeError::RangeNotSatisfiable(size) => build_416_response(*size),
        ServeError::MethodNotAllowed(_) => build_405_response(),
        _ => {
            let status = err.status();
            plain_text_response(status, &format!("{status} {}", err.status_text()))
        }
    }
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .body(ResponseBody::empty())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD")
        .body(ResponseBody::full(Bytes::from_static(
            b"405 Method Not Allowed",
        )))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(ResponseBody::full(Bytes::from_static(
            b"416 Range Not Satisfiable",
        )))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 200 OK response for a file
///
/// The caller supplies an empty body for HEAD requests; Content-Length
/// still advertises the full size.
pub fn build_file_response(
    body: ResponseBody,
    content_type: &str,
    content_length: u64,
    etag: &str,
    last_modified: Option<&str>,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag);

    if let Some(last_modified) = last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(ResponseBody::empty())
    })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    body: ResponseBody,
    content_type: &str,
    etag: &str,
    last_modified: Option<&str>,
    start: u64,
    end: u64,
    total_size: u64,
) -> Response<ResponseBody> {
    let content_length = end - start + 1;
    let mut builder = Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag);

    if let Some(last_modified) = last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(ResponseBody::empty())
    })
}

/// Build 200 OK response for a rendered directory listing
pub fn build_listing_response(html: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = html.len();
    let body = if is_head {
        ResponseBody::empty()
    } else {
        ResponseBody::full(Bytes::from(html))
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("listing", &e);
            Response::new(ResponseBody::empty())
        })
}

fn plain_text_response(status: u16, message: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(ResponseBody::full(Bytes::from(message.to_owned())))
        .unwrap_or_else(|e| {
            log_build_error("error", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    log::error!("Failed to build {status} response: {error}");
}
