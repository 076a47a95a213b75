//! End-to-end tests over a real listener.
//!
//! Each test builds a scratch directory, starts the accept loop on an
//! ephemeral port, and talks plain HTTP/1.1 over TCP.

use staticserve::config::{Config, LoggingConfig, PerformanceConfig, RoutesConfig, ServerConfig};
use staticserve::server;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn test_config(root: PathBuf, base_path: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_path: base_path.to_string(),
            root_dir: root,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            access_log: false,
            access_log_format: "combined".to_string(),
        },
        performance: PerformanceConfig {
            header_read_timeout: 5,
            read_timeout: 5,
            write_timeout: 5,
            idle_timeout: 30,
            stream_threshold: 262_144,
            max_connections: None,
        },
        routes: RoutesConfig {
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
        },
    }
}

async fn setup_root(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("staticserve-it-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&root).await;
    fs::create_dir_all(&root).await.unwrap();
    fs::canonicalize(&root).await.unwrap()
}

async fn start_server(root: PathBuf, base_path: &str) -> SocketAddr {
    let cfg = Arc::new(test_config(root, base_path));
    let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    server::accept_connection(stream, peer_addr, &cfg, &connections);
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn raw_request(addr: SocketAddr, request: &str) -> (u16, HashMap<String, String>, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_response(&raw)
}

async fn get(addr: SocketAddr, path: &str) -> (u16, HashMap<String, String>, Vec<u8>) {
    raw_request(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
    .await
}

async fn get_with_header(
    addr: SocketAddr,
    path: &str,
    header: &str,
) -> (u16, HashMap<String, String>, Vec<u8>) {
    raw_request(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{header}\r\nConnection: close\r\n\r\n"),
    )
    .await
}

fn parse_response(raw: &[u8]) -> (u16, HashMap<String, String>, Vec<u8>) {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header/body separator");
    let head = std::str::from_utf8(&raw[..split]).expect("header not UTF-8");
    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("missing status line");
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .expect("missing status code")
        .parse()
        .expect("status code not numeric");

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    (status, headers, raw[split + 4..].to_vec())
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from(i % 251).unwrap()).collect()
}

async fn write_file(root: &Path, name: &str, content: &[u8]) {
    fs::write(root.join(name), content).await.unwrap();
}

#[tokio::test]
async fn serves_small_file() {
    let root = setup_root("small").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (status, headers, body) = get(addr, "/a.txt").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"hi");
    assert_eq!(headers["content-length"], "2");
    assert_eq!(headers["content-type"], "text/plain; charset=utf-8");
    assert_eq!(headers["accept-ranges"], "bytes");
    assert!(headers.contains_key("etag"));
    assert!(headers.contains_key("last-modified"));
}

#[tokio::test]
async fn serves_percent_encoded_name() {
    let root = setup_root("encoded").await;
    write_file(&root, "my file.txt", b"spaced").await;
    let addr = start_server(root, "/").await;

    let (status, _, body) = get(addr, "/my%20file.txt").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"spaced");
}

#[tokio::test]
async fn missing_file_is_404() {
    let root = setup_root("missing").await;
    let addr = start_server(root, "/").await;

    let (status, _, _) = get(addr, "/missing.txt").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn traversal_is_403() {
    let root = setup_root("traversal").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (status, _, body) = get(addr, "/../etc/passwd").await;
    assert_eq!(status, 403);
    assert!(!body.windows(4).any(|w| w == b"root"));

    let (status, _, _) = get(addr, "/%2e%2e/%2e%2e/etc/passwd").await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn malformed_escape_is_400() {
    let root = setup_root("badescape").await;
    let addr = start_server(root, "/").await;

    let (status, _, _) = get(addr, "/bad%zz").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn open_range_matches_full_get() {
    let root = setup_root("fullrange").await;
    // Larger than the stream threshold so both paths stream
    let content = patterned(300_000);
    write_file(&root, "big.bin", &content).await;
    let addr = start_server(root, "/").await;

    let (status, _, full_body) = get(addr, "/big.bin").await;
    assert_eq!(status, 200);
    assert_eq!(full_body, content);

    let (status, headers, range_body) = get_with_header(addr, "/big.bin", "Range: bytes=0-").await;
    assert_eq!(status, 206);
    assert_eq!(range_body, full_body);
    assert_eq!(headers["content-range"], format!("bytes 0-299999/{}", content.len()));
}

#[tokio::test]
async fn first_byte_range() {
    let root = setup_root("firstbyte").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (status, headers, body) = get_with_header(addr, "/a.txt", "Range: bytes=0-0").await;
    assert_eq!(status, 206);
    assert_eq!(body, b"h");
    assert_eq!(headers["content-range"], "bytes 0-0/2");
    assert_eq!(headers["content-length"], "1");
}

#[tokio::test]
async fn suffix_range() {
    let root = setup_root("suffix").await;
    write_file(&root, "a.txt", b"0123456789").await;
    let addr = start_server(root, "/").await;

    let (status, headers, body) = get_with_header(addr, "/a.txt", "Range: bytes=-3").await;
    assert_eq!(status, 206);
    assert_eq!(body, b"789");
    assert_eq!(headers["content-range"], "bytes 7-9/10");
}

#[tokio::test]
async fn unsatisfiable_range_is_416() {
    let root = setup_root("badrange").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (status, headers, _) = get_with_header(addr, "/a.txt", "Range: bytes=5-").await;
    assert_eq!(status, 416);
    assert_eq!(headers["content-range"], "bytes */2");
}

#[tokio::test]
async fn if_none_match_yields_304() {
    let root = setup_root("inm").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (_, headers, _) = get(addr, "/a.txt").await;
    let etag = headers["etag"].clone();

    let (status, headers, body) =
        get_with_header(addr, "/a.txt", &format!("If-None-Match: {etag}")).await;
    assert_eq!(status, 304);
    assert!(body.is_empty());
    assert_eq!(headers["etag"], etag);
}

#[tokio::test]
async fn if_modified_since_yields_304() {
    let root = setup_root("ims").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (_, headers, _) = get(addr, "/a.txt").await;
    let last_modified = headers["last-modified"].clone();

    let (status, _, body) =
        get_with_header(addr, "/a.txt", &format!("If-Modified-Since: {last_modified}")).await;
    assert_eq!(status, 304);
    assert!(body.is_empty());
}

#[tokio::test]
async fn directory_index_matches_direct_get() {
    let root = setup_root("index").await;
    fs::create_dir_all(root.join("docs")).await.unwrap();
    write_file(&root, "docs/index.html", b"<html><body>home</body></html>").await;
    let addr = start_server(root, "/").await;

    let (status, _, direct) = get(addr, "/docs/index.html").await;
    assert_eq!(status, 200);

    let (status, headers, via_dir) = get(addr, "/docs/").await;
    assert_eq!(status, 200);
    assert_eq!(via_dir, direct);
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");

    // Without the trailing slash as well
    let (status, _, no_slash) = get(addr, "/docs").await;
    assert_eq!(status, 200);
    assert_eq!(no_slash, direct);
}

#[tokio::test]
async fn directory_listing_rendered() {
    let root = setup_root("listing").await;
    fs::create_dir_all(root.join("pub/sub")).await.unwrap();
    write_file(&root, "pub/z.txt", b"z").await;
    write_file(&root, "pub/a space.txt", b"a").await;
    let addr = start_server(root, "/").await;

    let (status, headers, body) = get(addr, "/pub/").await;
    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("href=\"/pub/sub/\""));
    assert!(html.contains("href=\"/pub/a%20space.txt\""));
    assert!(html.contains("href=\"/pub/z.txt\""));
    // Directory entry sorts before the files
    assert!(html.find("sub/").unwrap() < html.find("a space.txt").unwrap());
}

#[tokio::test]
async fn head_has_headers_but_no_body() {
    let root = setup_root("head").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/").await;

    let (status, headers, body) = raw_request(
        addr,
        "HEAD /a.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(headers["content-length"], "2");
    assert!(body.is_empty());
}

#[tokio::test]
async fn post_is_405_with_allow() {
    let root = setup_root("method").await;
    let addr = start_server(root, "/").await;

    let (status, headers, _) = raw_request(
        addr,
        "POST /a.txt HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert_eq!(status, 405);
    assert_eq!(headers["allow"], "GET, HEAD");
}

#[tokio::test]
async fn base_path_is_stripped() {
    let root = setup_root("base").await;
    write_file(&root, "a.txt", b"hi").await;
    let addr = start_server(root, "/files").await;

    let (status, _, body) = get(addr, "/files/a.txt").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"hi");

    // Outside the base path
    let (status, _, _) = get(addr, "/a.txt").await;
    assert_eq!(status, 404);

    // Prefix match must respect the segment boundary
    let (status, _, _) = get(addr, "/filesystem/a.txt").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn extensionless_text_is_sniffed() {
    let root = setup_root("sniff").await;
    write_file(&root, "README", b"plain words here").await;
    let addr = start_server(root, "/").await;

    let (status, headers, _) = get(addr, "/README").await;
    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "text/plain; charset=utf-8");
}
