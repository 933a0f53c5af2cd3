//! dynamic-mux
//!
//! An HTTP router whose routes can be added and removed while it serves.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 DYNAMIC MUX                  │
//!     Client Request     │  ┌─────────┐    ┌──────────────────────┐     │
//!     ───────────────────┼─▶│  http   │───▶│ routing (read lock)  │     │
//!                        │  │ server  │    │ canonicalize + match │     │
//!                        │  └─────────┘    └──────────┬───────────┘     │
//!                        │                            ▼                 │
//!     Client Response    │               ┌────────────────────────┐     │
//!     ◀──────────────────┼───────────────│ handler (lock released)│     │
//!                        │               │ static/redirect/proxy  │     │
//!                        │               └────────────────────────┘     │
//!                        │                                              │
//!     Admin API ─────────┼─▶ register / deregister (write lock)         │
//!     Config reload ─────┼─▶ reconcile configured routes                │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dynamic_mux::admin::serve_admin;
use dynamic_mux::config::{load_config, watcher::ConfigWatcher, MuxConfig};
use dynamic_mux::lifecycle::{signals::spawn_signal_listener, Shutdown};
use dynamic_mux::observability::{logging::init_logging, metrics::init_metrics};
use dynamic_mux::HttpServer;

#[derive(Parser)]
#[command(name = "dynamic-mux")]
#[command(about = "HTTP router with runtime route registration", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MuxConfig::default(),
    };

    if cli.check {
        println!("configuration ok: {} route(s)", config.routes.len());
        return Ok(());
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dynamic-mux starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => (None, tokio::sync::mpsc::unbounded_channel().1),
    };

    let server = HttpServer::new(config.clone())?;

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = server.admin_state();
        let admin_shutdown = shutdown.subscribe();
        Some(tokio::spawn(serve_admin(state, listener, admin_shutdown)))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    if let Some(task) = admin_task {
        task.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
