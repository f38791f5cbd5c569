//! Relay server listener
//!
//! Binds the TCP listener, starts the hub and serves the router until the
//! shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::error::Result;
use crate::registry::RegistryConfig;
use crate::server::config::ServerConfig;
use crate::server::http::{router, AppState};
use crate::server::hub::Hub;

/// Relay server
#[derive(Debug, Clone)]
pub struct RelayServer {
    config: ServerConfig,
    registry_config: RegistryConfig,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with a custom room lifecycle policy
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        Self {
            config,
            registry_config,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Room lifecycle configuration
    pub fn registry_config(&self) -> &RegistryConfig {
        &self.registry_config
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method runs until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            delete_room_on_producer_disconnect = self.registry_config.delete_room_on_producer_disconnect,
            "Relay server listening"
        );

        let (hub, handle) = Hub::new(self.registry_config.clone(), self.config.stats_interval);
        let hub_task = hub.spawn();

        let app = router(AppState::new(handle, &self.config));
        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
        })
        .await;

        // Stop the hub on shutdown
        hub_task.abort();

        result.map_err(Into::into)
    }
}
