//! Relay server
//!
//! Wires the pieces together: builds the registry from configuration,
//! starts one ingest task per stream, and serves viewers over HTTP.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::distributor::Distributor;
use crate::error::Result;
use crate::registry::StreamRegistry;
use crate::server::config::RelayConfig;
use crate::server::http;
use crate::server::listener::spawn_ingest_listeners;

/// Camera frame relay
pub struct RelayServer {
    config: RelayConfig,
    registry: Arc<StreamRegistry>,
}

impl RelayServer {
    /// Create a server, registering every valid configured stream
    ///
    /// Invalid stream entries are logged and skipped.
    pub fn new(config: RelayConfig) -> Self {
        let (registry, _skipped) = StreamRegistry::from_descriptors(config.source_streams.clone());

        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Get the configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Distributor over this server's registry
    pub fn distributor(&self) -> Distributor {
        Distributor::with_poll_interval(
            Arc::clone(&self.registry),
            self.config.distribution.poll_interval,
        )
        .keepalive(self.config.distribution.keepalive)
    }

    /// HTTP routes for this server
    pub fn router(&self) -> Router {
        http::router(self.distributor(), self.config.distribution.encoder())
    }

    /// Get the configured HTTP address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.http_addr()
    }

    /// Run the server
    ///
    /// This method blocks until the HTTP listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.http_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Run on an already bound HTTP listener until `shutdown` completes
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.registry.stream_count() == 0 {
            tracing::warn!("No stream sources configured");
        }

        let ingest = spawn_ingest_listeners(&self.registry, &self.config.ingest);

        tracing::info!(
            addr = ?listener.local_addr().ok(),
            streams = self.registry.stream_count(),
            "HTTP server listening"
        );

        // Viewer responses never end on their own, so shutdown does not wait
        // for open connections to drain.
        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = axum::serve(listener, self.router()).into_future() => result,
        };

        for handle in ingest {
            handle.abort();
        }

        Ok(result?)
    }
}
