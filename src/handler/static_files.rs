//! File response module
//!
//! Turns a resolved file path into an HTTP response: conditional request
//! handling, byte ranges, content-type detection, and body streaming.

use crate::config::Config;
use crate::error::ServeError;
use crate::handler::router::RequestContext;
use crate::http::body::{FileStreamBody, ResponseBody, STREAM_CHUNK_SIZE};
use crate::http::range::RangeParseResult;
use crate::http::{cache, mime, parse_range_header, response};
use hyper::body::Bytes;
use hyper::Response;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Serve a resolved regular file
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    cfg: &Config,
    path: &Path,
) -> Result<Response<ResponseBody>, ServeError> {
    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        // The file can vanish between resolution and here
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ServeError::NotFound),
        Err(e) => return Err(e.into()),
    };
    let size = metadata.len();
    let modified = metadata.modified().ok();
    let etag = cache::file_etag(size, modified);
    let last_modified = modified.map(cache::format_last_modified);

    if cache::not_modified(
        ctx.if_none_match.as_deref(),
        ctx.if_modified_since.as_deref(),
        &etag,
        modified,
    ) {
        return Ok(response::build_304_response(&etag));
    }

    match parse_range_header(ctx.range.as_deref(), size) {
        RangeParseResult::NotSatisfiable => Err(ServeError::RangeNotSatisfiable(size)),
        RangeParseResult::Valid(span) => {
            let start = span.start;
            let end = span.end_position(size);
            serve_range(ctx, cfg, path, size, &etag, last_modified.as_deref(), start, end).await
        }
        RangeParseResult::None => {
            serve_full(ctx, cfg, path, size, &etag, last_modified.as_deref()).await
        }
    }
}

async fn serve_full(
    ctx: &RequestContext<'_>,
    cfg: &Config,
    path: &Path,
    size: u64,
    etag: &str,
    last_modified: Option<&str>,
) -> Result<Response<ResponseBody>, ServeError> {
    let mut file = open_served(path).await?;
    let content_type = detect_content_type(path, &mut file).await?;

    if ctx.is_head {
        return Ok(response::build_file_response(
            ResponseBody::empty(),
            content_type,
            size,
            etag,
            last_modified,
        ));
    }

    if size <= cfg.performance.stream_threshold {
        let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        (&mut file).take(size).read_to_end(&mut buf).await?;
        // Content-Length must match what is actually sent
        let content_length = buf.len() as u64;
        return Ok(response::build_file_response(
            ResponseBody::full(Bytes::from(buf)),
            content_type,
            content_length,
            etag,
            last_modified,
        ));
    }

    let body = ResponseBody::file(FileStreamBody::new(
        file,
        size,
        STREAM_CHUNK_SIZE,
        cfg.performance.write_timeout(),
    ));
    Ok(response::build_file_response(
        body,
        content_type,
        size,
        etag,
        last_modified,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn serve_range(
    ctx: &RequestContext<'_>,
    cfg: &Config,
    path: &Path,
    size: u64,
    etag: &str,
    last_modified: Option<&str>,
    start: u64,
    end: u64,
) -> Result<Response<ResponseBody>, ServeError> {
    let mut file = open_served(path).await?;
    let content_type = detect_content_type(path, &mut file).await?;

    if ctx.is_head {
        return Ok(response::build_partial_response(
            ResponseBody::empty(),
            content_type,
            etag,
            last_modified,
            start,
            end,
            size,
        ));
    }

    file.seek(SeekFrom::Start(start)).await?;
    // Ranges always stream; the span is never buffered whole
    let body = ResponseBody::file(FileStreamBody::new(
        file,
        end - start + 1,
        STREAM_CHUNK_SIZE,
        cfg.performance.write_timeout(),
    ));
    Ok(response::build_partial_response(
        body,
        content_type,
        etag,
        last_modified,
        start,
        end,
        size,
    ))
}

async fn open_served(path: &Path) -> Result<File, ServeError> {
    File::open(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ServeError::NotFound,
        io::ErrorKind::PermissionDenied => {
            ServeError::Forbidden(format!("read access denied for '{}'", path.display()))
        }
        _ => ServeError::Io(e),
    })
}

/// Content type from the extension table, falling back to sniffing the
/// file's first bytes. Leaves the file positioned at the start.
async fn detect_content_type(path: &Path, file: &mut File) -> Result<&'static str, ServeError> {
    if let Some(content_type) = mime::from_extension(path.extension().and_then(|e| e.to_str())) {
        return Ok(content_type);
    }

    let mut head = [0u8; mime::SNIFF_LEN];
    let mut filled = 0;
    loop {
        let n = file.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == head.len() {
            break;
        }
    }
    file.seek(SeekFrom::Start(0)).await?;
    Ok(mime::sniff_content_type(&head[..filled]))
}
