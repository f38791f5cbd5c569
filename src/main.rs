//! Relay server binary
//!
//! Run with: tree-relay [BIND_ADDR]
//!
//! Examples:
//!   tree-relay                     # binds to 0.0.0.0:$PORT (default 3000)
//!   tree-relay 127.0.0.1:8080      # binds to 127.0.0.1:8080
//!
//! Environment:
//!   PORT, TREE_RELAY_HOST, TREE_RELAY_MAX_CONNECTIONS, TREE_RELAY_PUBLIC_DIR,
//!   TREE_RELAY_DELETE_ROOM_ON_DISCONNECT, TREE_RELAY_SPARE_TAKEN_OVER_ROOMS,
//!   TREE_RELAY_ORPHAN_TTL_SECS, RUST_LOG

use std::net::SocketAddr;

use tree_relay::{RegistryConfig, RelayServer, ServerConfig};

fn print_usage() {
    eprintln!("Usage: tree-relay [BIND_ADDR]");
    eprintln!();
    eprintln!("  BIND_ADDR  address to listen on, e.g. 127.0.0.1:8080");
    eprintln!("             (default: TREE_RELAY_HOST:PORT, 0.0.0.0:3000)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tree_relay=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServerConfig::from_env()?;
    if let Some(raw) = args.get(1) {
        match raw.parse::<SocketAddr>() {
            Ok(addr) => config = config.bind(addr),
            Err(_) => {
                eprintln!("Error: invalid bind address '{}'", raw);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
    let registry_config = RegistryConfig::from_env()?;

    let server = RelayServer::with_registry_config(config, registry_config);
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Relay stopped");
    Ok(())
}
