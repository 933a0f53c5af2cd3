//! Registration errors.
//!
//! All variants are returned synchronously to the caller of the
//! registration API. Routing itself never fails: unmatched requests
//! degrade to a 404 response.

use thiserror::Error;

/// Errors returned by [`DynamicMux`](super::DynamicMux) registration calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern string was empty.
    #[error("invalid pattern: pattern must not be empty")]
    InvalidPattern,

    /// No handler was supplied for the registration.
    #[error("nil handler")]
    NilHandler,

    /// An explicit entry already exists for this pattern.
    #[error("multiple registrations for {0}")]
    DuplicateRegistration(String),

    /// No explicit entry exists for this pattern.
    #[error("pattern was not registered: {0}")]
    UnknownPattern(String),
}
