//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that hands every request to the mux
//! - Wire up middleware (tracing, timeout, request ID)
//! - Install configured routes and apply reloaded ones
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::AdminState;
use crate::config::MuxConfig;
use crate::http::request::MakeRequestUuid;
use crate::routing::provision::{install_routes, sync_routes};
use crate::routing::{DynamicMux, HandlerFactory, MuxService, ProvisionError};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install configured routes: {0}")]
    Provision(#[from] ProvisionError),
}

/// HTTP server fronting a [`DynamicMux`].
pub struct HttpServer {
    config: MuxConfig,
    mux: Arc<DynamicMux>,
    factory: HandlerFactory,
}

impl HttpServer {
    /// Create a server with a fresh mux holding the configured routes.
    pub fn new(config: MuxConfig) -> Result<Self, ServerError> {
        Self::with_mux(config, Arc::new(DynamicMux::new()))
    }

    /// Create a server around an existing mux, adding the configured routes.
    pub fn with_mux(config: MuxConfig, mux: Arc<DynamicMux>) -> Result<Self, ServerError> {
        let factory = HandlerFactory::new();
        install_routes(&mux, &factory, &config.routes)?;
        Ok(Self { config, mux, factory })
    }

    /// The mux serving this server's traffic.
    pub fn mux(&self) -> Arc<DynamicMux> {
        self.mux.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// State for the admin API, sharing this server's mux.
    pub fn admin_state(&self) -> AdminState {
        AdminState::new(self.mux.clone(), self.factory.clone(), self.config.admin.api_key.clone())
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .fallback_service(MuxService::new(self.mux.clone()))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` have their routes reconciled
    /// into the mux. Returns once `shutdown` fires and in-flight requests
    /// have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<MuxConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.mux.patterns().len(),
            "HTTP server starting"
        );

        let app = self.router();

        let mux = self.mux.clone();
        let factory = self.factory.clone();
        let mut current = self.config.routes.clone();
        let reloader = tokio::spawn(async move {
            while let Some(next) = config_updates.recv().await {
                current = sync_routes(&mux, &factory, &current, &next.routes).routes;
            }
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
