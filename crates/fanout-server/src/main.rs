//! Command-line entry point for the fan-out relay hub.

use std::sync::Arc;

use clap::Parser;
use fanout_server::{RandomIdAllocator, Server, ServerConfig};

/// A message fan-out relay hub: clients register, discover each other, and
/// relay message bodies through the server without it interpreting them.
#[derive(Debug, Parser)]
#[command(name = "fanout-server", version, about)]
struct Cli {
    /// Address to bind the listening socket to.
    #[arg(long, default_value = "0.0.0.0:7878")]
    bind: String,

    /// Maximum number of simultaneously registered connections.
    #[arg(long, default_value_t = 10_000)]
    max_connections: usize,

    /// Maximum relay message body length, in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    max_message_bytes: u32,

    /// Log level passed to the tracing env filter as a default, overridden
    /// by the `RUST_LOG` environment variable when set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = ServerConfig {
        bind: cli.bind,
        max_connections: cli.max_connections,
        max_message_bytes: cli.max_message_bytes,
    };

    let server = Server::bind(config, Arc::new(RandomIdAllocator::new())).await?;

    tokio::select! {
        result = server.run() => {
            result?;
        },
        ctrl_c = tokio::signal::ctrl_c() => {
            ctrl_c?;
            tracing::info!("ctrl-c received, shutting down");
            server.stop().await?;
        },
    }

    Ok(())
}

/// Initialize `tracing-subscriber` with `RUST_LOG` taking precedence over
/// `--log-level`.
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
