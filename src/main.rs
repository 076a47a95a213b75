use clap::Parser;
use staticserve::config::{Cli, Config};
use staticserve::{logger, server};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();

    let cfg = match Config::load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    logger::init(&cfg.logging.level);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to build runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cfg)) {
        log::error!("Server failed to start: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_listener(addr)
        .map_err(|e| format!("cannot listen on {addr}: {e}"))?;

    let cfg = Arc::new(cfg);
    let connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&addr, &cfg);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    server::accept_connection(stream, peer_addr, &cfg, &connections);
                }
                Err(e) => log::error!("Failed to accept connection: {e}"),
            },
            _ = &mut shutdown => {
                log::info!("Shutdown signal received, stopping listener");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            log::error!("Cannot install SIGTERM handler: {e}");
            // Fall back to Ctrl+C only
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
