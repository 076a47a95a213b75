// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 requests on it
// until the peer closes, an error occurs, or a deadline fires.

use crate::config::Config;
use crate::handler;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;

/// Accept and process a connection, checking limits and logging.
///
/// Spawns one task per connection; all per-request state lives inside that
/// task. The counter is incremented before the limit check so two racing
/// accepts cannot both slip under the cap.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    cfg: &Arc<Config>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = cfg.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            log::warn!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            );
            drop(stream);
            return;
        }
    }

    log::debug!("Accepted connection from {peer_addr}");
    handle_connection(stream, peer_addr, Arc::clone(cfg), Arc::clone(conn_counter));
}

/// Serve a single connection in a spawned task.
///
/// The header phase is bounded by hyper's header-read timeout; the whole
/// connection is bounded by the idle timeout, so a silent peer cannot pin
/// a task forever. Write stalls are bounded per-chunk inside the
/// streaming response body.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    cfg: Arc<Config>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let connection_deadline = cfg.performance.idle_timeout();
        let service_cfg = Arc::clone(&cfg);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(true)
            .header_read_timeout(cfg.performance.header_read_timeout());

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_cfg), peer_addr)
            }),
        );

        match tokio::time::timeout(connection_deadline, conn).await {
            Ok(Ok(())) => {}
            // Parse failures and client disconnects end up here; hyper has
            // already written the 400 where one applies
            Ok(Err(err)) => log::debug!("Connection from {peer_addr} ended: {err}"),
            Err(_) => log::debug!(
                "Connection from {peer_addr} closed after {}s deadline",
                connection_deadline.as_secs()
            ),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
