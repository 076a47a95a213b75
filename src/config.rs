// Configuration module
// Layered configuration: built-in defaults, optional config file,
// STATICSERVE_* environment variables, then command-line flags on top.
// The resulting Config is immutable after startup and shared behind Arc.

use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line flags
#[derive(Parser, Debug, Clone)]
#[command(name = "staticserve", version, about = "Serve static files from a local directory over HTTP")]
pub struct Cli {
    /// Directory to serve static files from
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Port to listen on
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Base URL path stripped before resolving against the directory
    #[arg(short = 'b', long)]
    pub base_path: Option<String>,

    /// Configuration file (without extension)
    #[arg(short = 'c', long, default_value = "config")]
    pub config: String,
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// URL prefix stripped from request paths; requests outside it are 404
    pub base_path: String,
    /// Root directory all served paths must resolve under.
    /// Canonicalized during [`Config::load`].
    pub root_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format: "combined" or "common"
    pub access_log_format: String,
}

/// Performance configuration (timeouts in seconds)
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub header_read_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub idle_timeout: u64,
    /// Files up to this many bytes are served from one buffered read;
    /// larger payloads stream in chunks
    pub stream_threshold: u64,
    pub max_connections: Option<u64>,
}

/// Routing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// File names probed, in order, when a directory is requested
    pub index_files: Vec<String>,
}

impl Config {
    /// Load configuration and apply CLI overrides.
    ///
    /// The root directory is canonicalized here; a missing directory, a
    /// non-directory path, or port 0 are startup errors.
    pub fn load(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&cli.config).required(false))
            .add_source(config::Environment::with_prefix("STATICSERVE"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8100)?
            .set_default("server.base_path", "/")?
            .set_default("server.root_dir", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.header_read_timeout", 2)?
            .set_default("performance.read_timeout", 1)?
            .set_default("performance.write_timeout", 1)?
            .set_default("performance.idle_timeout", 30)?
            .set_default("performance.stream_threshold", 262_144)?
            .set_default(
                "routes.index_files",
                vec!["index.html".to_string(), "index.htm".to_string()],
            )?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;

        // CLI flags win over file and environment
        if let Some(dir) = &cli.directory {
            cfg.server.root_dir = dir.clone();
        }
        if let Some(port) = cli.port {
            cfg.server.port = port;
        }
        if let Some(base) = &cli.base_path {
            cfg.server.base_path = base.clone();
        }

        cfg.prepare()?;
        Ok(cfg)
    }

    fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.server.port == 0 {
            return Err("listen port must be between 1 and 65535".into());
        }

        self.server.base_path = normalize_base_path(&self.server.base_path);

        let canonical = std::fs::canonicalize(&self.server.root_dir).map_err(|e| {
            format!(
                "invalid root directory '{}': {e}",
                self.server.root_dir.display()
            )
        })?;
        if !canonical.is_dir() {
            return Err(format!("root path '{}' is not a directory", canonical.display()).into());
        }
        self.server.root_dir = canonical;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl PerformanceConfig {
    pub fn header_read_timeout(&self) -> Duration {
        Duration::from_secs(self.header_read_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

/// Normalize a base path: ensure a leading slash, strip trailing slashes.
/// `""`, `"/"` and `"files/"` become `"/"`, `"/"` and `"/files"`.
pub fn normalize_base_path(base: &str) -> String {
    let trimmed = base.trim();
    let mut path = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}
