//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign and propagate request ID)
//!     → routing::MuxService (dynamic route lookup)
//!     → matched handler (static, redirect, proxy.rs, or caller-supplied)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
