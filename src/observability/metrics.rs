//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mux_requests_total` (counter): dispatched requests by outcome, status
//! - `mux_request_duration_seconds` (histogram): dispatch latency by outcome
//! - `mux_routes_registered` (gauge): entries in the route table
//! - `mux_route_changes_total` (counter): register/deregister calls by result
//!
//! # Design Decisions
//! - Prometheus exporter runs its own listener
//! - Without an installed recorder every call is a no-op (tests, CLI)

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::RouteError;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_dispatch(outcome: &'static str, status: StatusCode, start: Instant) {
    counter!(
        "mux_requests_total",
        "outcome" => outcome,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    histogram!("mux_request_duration_seconds", "outcome" => outcome).record(start.elapsed().as_secs_f64());
}

/// Record a registration or deregistration attempt.
pub fn record_route_change(op: &'static str, result: &Result<(), RouteError>) {
    let result = match result {
        Ok(()) => "ok",
        Err(RouteError::InvalidPattern) => "invalid_pattern",
        Err(RouteError::NilHandler) => "nil_handler",
        Err(RouteError::DuplicateRegistration(_)) => "duplicate",
        Err(RouteError::UnknownPattern(_)) => "unknown",
    };
    counter!("mux_route_changes_total", "op" => op, "result" => result).increment(1);
}

pub fn set_routes_registered(count: usize) {
    gauge!("mux_routes_registered").set(count as f64);
}
