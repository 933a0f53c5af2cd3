//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, host, path)
//!     → mux.rs (`*` target? → 400)
//!     → canonical.rs (non-canonical path? → 301 to canonical form)
//!     → table.rs + matcher.rs (host+path, then path; longest pattern wins)
//!     → handler.rs (matched handler, implicit redirect, or 404)
//!
//! Runtime registration (admin API, config reload):
//!     provision.rs (RouteConfig → Handler)
//!     → mux.rs register / deregister (write lock)
//!     → table.rs (explicit entry + implicit subtree redirect)
//! ```
//!
//! # Design Decisions
//! - Routes can be added and removed while requests are in flight
//! - Deterministic: same table and request always select the same pattern
//! - No regex in hot path (exact and prefix matching only)
//! - Handlers run outside the table lock

pub mod canonical;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod mux;
pub mod provision;
mod table;

pub use error::RouteError;
pub use handler::{handler_fn, Handler, HandlerFn, NotFound, Redirect, SharedHandler, StaticResponse};
pub use mux::{DynamicMux, MuxService, Route, RouteKind};
pub use provision::{HandlerFactory, ProvisionError};
