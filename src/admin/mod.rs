//! Admin API: the runtime control surface of the mux.
//!
//! # Endpoints
//! - `GET /admin/status`: version and route count
//! - `GET /admin/routes`: every registered pattern, sorted
//! - `POST /admin/routes`: register a route (JSON `RouteConfig`)
//! - `DELETE /admin/routes?pattern=...`: deregister a route
//!
//! All endpoints require `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::routing::{DynamicMux, HandlerFactory};
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state of the admin API.
#[derive(Clone)]
pub struct AdminState {
    pub mux: Arc<DynamicMux>,
    pub factory: HandlerFactory,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(mux: Arc<DynamicMux>, factory: HandlerFactory, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            mux,
            factory,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route(
            "/admin/routes",
            get(list_routes).post(register_route).delete(deregister_route),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API on `listener` until `shutdown` fires.
pub async fn serve_admin(
    state: AdminState,
    listener: TcpListener,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
