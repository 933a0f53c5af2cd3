//! Dynamic HTTP request router.
//!
//! A request multiplexer whose routes can be registered and removed at
//! runtime while requests are being served, plus the service around it:
//! configuration with hot reload, an admin API, and observability.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::MuxConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{DynamicMux, Handler, RouteError};
