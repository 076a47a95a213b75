//! Directory listing module
//!
//! A directory request serves the first configured index file when one
//! exists; otherwise it renders a minimal HTML listing. Listing order is
//! directories first, then files, each group sorted lexicographically by
//! name. Links are absolute (they include the base path) and
//! percent-encoded; display names are HTML-escaped.

use crate::config::Config;
use crate::error::ServeError;
use crate::handler::router::RequestContext;
use crate::handler::static_files;
use crate::http::body::ResponseBody;
use crate::http::{escape, response};
use hyper::Response;
use std::io;
use std::path::Path;
use tokio::fs;

/// Serve a resolved directory
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    cfg: &Config,
    dir: &Path,
) -> Result<Response<ResponseBody>, ServeError> {
    for index in &cfg.routes.index_files {
        let candidate = dir.join(index);
        if let Ok(metadata) = fs::metadata(&candidate).await {
            if metadata.is_file() {
                return static_files::serve_file(ctx, cfg, &candidate).await;
            }
        }
    }

    let entries = read_entries(dir).await?;
    let html = render_listing(ctx.raw_path, &entries);
    Ok(response::build_listing_response(html, ctx.is_head))
}

struct ListEntry {
    name: String,
    is_dir: bool,
}

async fn read_entries(dir: &Path) -> Result<Vec<ListEntry>, ServeError> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(r) => r,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(ServeError::Forbidden(format!(
                "cannot list '{}'",
                dir.display()
            )));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ServeError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        // Names that are not valid UTF-8 cannot appear in an HTML link
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push(ListEntry { name, is_dir });
    }

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

fn render_listing(request_path: &str, entries: &[ListEntry]) -> String {
    let href_base = if request_path.ends_with('/') {
        request_path.to_string()
    } else {
        format!("{request_path}/")
    };
    let title = escape::html_escape(
        &escape::percent_decode(request_path).unwrap_or_else(|| request_path.to_string()),
    );

    let mut rows = String::new();
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let href = format!(
            "{href_base}{}{suffix}",
            escape::percent_encode_segment(&entry.name)
        );
        let display = escape::html_escape(&entry.name);
        rows.push_str(&format!(
            "<li><a href=\"{href}\">{display}{suffix}</a></li>\n"
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Index of {title}</title></head>\n\
         <body>\n<h1>Index of {title}</h1>\n<ul>\n{rows}</ul>\n</body>\n</html>\n"
    )
}
