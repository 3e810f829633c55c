//! geo-endpoint
//!
//! ```text
//!     Client Request         ┌───────────────────────────────────────────┐
//!     (CF-Connecting-IP,     │                GEO ENDPOINT               │
//!      platform metadata)    │                                           │
//!     ───────────────────────┼─▶ http::server ──▶ http::request          │
//!                            │   (request id,      (IP, metadata)        │
//!                            │    trace, timeout,        │               │
//!                            │    panic capture)         ▼               │
//!                            │                    geo::builder           │
//!     JSON Response          │                    (presence, as field,   │
//!     ◀──────────────────────┼──────────────────── failure boundary)     │
//!                            │                                           │
//!                            │   config · observability · lifecycle      │
//!                            └───────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use geo_endpoint::config::{load_config, GeoConfig};
use geo_endpoint::observability::{logging, metrics};
use geo_endpoint::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "geo-endpoint")]
#[command(about = "Echo edge-supplied geo-location metadata as JSON", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GeoConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("geo-endpoint v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = ?cli.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        metadata_header = %config.metadata.header,
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;

    if server.config().observability.metrics_enabled {
        let addr: SocketAddr = server.config().observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
