//! Logger module
//!
//! Severity logging goes through the `log` facade backed by `env_logger`;
//! access logging renders entries in Apache-style formats on the `access`
//! target.

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use log::info;
use std::net::SocketAddr;

/// Initialize the logger.
///
/// Should be called once at application startup, after configuration is
/// loaded. `RUST_LOG` overrides the configured level.
pub fn init(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // Repeated calls (tests) are harmless
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: "access", "{}", entry.format(format));
}

pub fn log_server_start(addr: &SocketAddr, cfg: &Config) {
    info!("======================================");
    info!("Static file server started");
    info!(
        "Serving {} at http://{addr}{}",
        cfg.server.root_dir.display(),
        cfg.server.base_path
    );
    info!("Log level: {}", cfg.logging.level);
    if let Some(max_conn) = cfg.performance.max_connections {
        info!("Max connections: {max_conn}");
    }
    info!("======================================");
}
