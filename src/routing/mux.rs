//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Own the route table behind a reader/writer lock
//! - Register and deregister handlers at runtime
//! - Resolve a request to exactly one handler and invoke it
//!
//! # Design Decisions
//! - Lookups share the read lock; mutations take the write lock
//! - The lock is released before any handler runs, so a slow handler
//!   never blocks routing of other requests or table updates
//! - Unmatched requests get the builtin 404 handler, never an error
//! - Mounted into axum through [`MuxService`]

use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode, Version},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::Service;

use super::canonical::{clean_path, decode_path, redirect_location};
use super::error::RouteError;
use super::handler::{handler_fn, Handler, NotFound, Redirect, SharedHandler};
use super::table::RouteTable;
use crate::observability::metrics;

/// How a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// A caller-registered handler.
    Registered,
    /// The redirect synthesized for a subtree's trimmed form.
    ImplicitRedirect,
    /// Redirect to the canonical form of a non-canonical path.
    CanonicalRedirect,
    /// Nothing matched.
    NotFound,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Registered => "registered",
            RouteKind::ImplicitRedirect => "implicit_redirect",
            RouteKind::CanonicalRedirect => "canonical_redirect",
            RouteKind::NotFound => "not_found",
        }
    }
}

/// The handler selected for a request.
#[derive(Clone)]
pub struct Route {
    pub handler: SharedHandler,
    /// Matched pattern; for redirects, the pattern the redirect will hit.
    /// Empty when nothing matched.
    pub pattern: String,
    pub kind: RouteKind,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("kind", &self.kind)
            .finish()
    }
}

/// An HTTP request multiplexer whose routes can be removed as well as added.
pub struct DynamicMux {
    table: RwLock<RouteTable>,
    not_found: SharedHandler,
}

impl DynamicMux {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RouteTable::new()),
            not_found: Arc::new(NotFound),
        }
    }

    // A panicking writer cannot leave the table half-updated: every
    // mutation validates before touching the map.
    fn read(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for `pattern`.
    pub fn register<H: Handler>(&self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register_shared(pattern, Some(Arc::new(handler)))
    }

    /// Register an async closure for `pattern`.
    pub fn register_fn<F, Fut, R>(&self, pattern: &str, f: F) -> Result<(), RouteError>
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        self.register(pattern, handler_fn(f))
    }

    /// Register an already shared handler. `None` fails with
    /// [`RouteError::NilHandler`].
    pub fn register_shared(&self, pattern: &str, handler: Option<SharedHandler>) -> Result<(), RouteError> {
        let result = {
            let mut table = self.write();
            let result = table.insert(pattern, handler);
            metrics::set_routes_registered(table.len());
            result
        };
        metrics::record_route_change("register", &result);

        match &result {
            Ok(()) => tracing::info!(pattern = %pattern, "Route registered"),
            Err(e) => tracing::warn!(pattern = %pattern, error = %e, "Route registration rejected"),
        }
        result
    }

    /// Remove the explicit registration for `pattern`, together with its
    /// implicit redirect if it owns one.
    pub fn deregister(&self, pattern: &str) -> Result<(), RouteError> {
        let result = {
            let mut table = self.write();
            let result = table.remove(pattern);
            metrics::set_routes_registered(table.len());
            result
        };
        metrics::record_route_change("deregister", &result);

        match &result {
            Ok(()) => tracing::info!(pattern = %pattern, "Route deregistered"),
            Err(e) => tracing::warn!(pattern = %pattern, error = %e, "Route deregistration rejected"),
        }
        result
    }

    /// Deregister `pattern` and register it again with `handler` under one
    /// write lock, so requests never observe the pattern missing.
    pub fn replace(&self, pattern: &str, handler: Option<SharedHandler>) -> Result<(), RouteError> {
        let result = {
            let mut table = self.write();
            let result = table.replace(pattern, handler);
            metrics::set_routes_registered(table.len());
            result
        };
        metrics::record_route_change("replace", &result);

        match &result {
            Ok(()) => tracing::info!(pattern = %pattern, "Route replaced"),
            Err(e) => tracing::warn!(pattern = %pattern, error = %e, "Route replacement rejected"),
        }
        result
    }

    /// Every registered pattern, explicit and implicit, sorted.
    pub fn patterns(&self) -> Vec<String> {
        self.read().patterns()
    }

    /// Whether any host-qualified pattern has ever been registered.
    pub fn has_hosts(&self) -> bool {
        self.read().has_hosts()
    }

    /// Select the handler for `req` without invoking it.
    ///
    /// Never fails: non-canonical paths resolve to a redirect and
    /// unmatched paths to the 404 handler.
    pub fn route(&self, req: &Request<Body>) -> Route {
        let host = request_host(req);
        let path = decode_path(req.uri().path());

        if req.method() != Method::CONNECT {
            let canonical = clean_path(&path);
            if canonical != path {
                let pattern = self.resolve(host, &canonical).pattern;
                let location = redirect_location(req.uri(), &canonical);
                return Route {
                    handler: Arc::new(Redirect::permanent(location)),
                    pattern,
                    kind: RouteKind::CanonicalRedirect,
                };
            }
        }

        self.resolve(host, &path)
    }

    fn resolve(&self, host: &str, path: &str) -> Route {
        let found = self.read().find(host, path);

        match found {
            Some(m) => Route {
                handler: m.handler,
                pattern: m.pattern,
                kind: if m.explicit {
                    RouteKind::Registered
                } else {
                    RouteKind::ImplicitRedirect
                },
            },
            None => Route {
                handler: self.not_found.clone(),
                pattern: String::new(),
                kind: RouteKind::NotFound,
            },
        }
    }

    /// Route `req` to its handler and return the handler's response.
    pub async fn dispatch(&self, req: Request<Body>) -> Response {
        let start = Instant::now();

        if req.uri().path() == "*" {
            let response = bad_request(req.version());
            metrics::record_dispatch("bad_request", response.status(), start);
            return response;
        }

        let route = self.route(&req);
        tracing::debug!(
            method = %req.method(),
            path = %req.uri().path(),
            pattern = %route.pattern,
            kind = route.kind.as_str(),
            "Request routed"
        );

        let response = route.handler.call(req).await;
        metrics::record_dispatch(route.kind.as_str(), response.status(), start);
        response
    }
}

impl Default for DynamicMux {
    fn default() -> Self {
        Self::new()
    }
}

/// Host the request was addressed to: the target's authority if it has
/// one, else the `Host` header.
fn request_host(req: &Request<Body>) -> &str {
    if let Some(authority) = req.uri().authority() {
        return authority.as_str();
    }
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

fn bad_request(version: Version) -> Response {
    let mut response = StatusCode::BAD_REQUEST.into_response();
    if version >= Version::HTTP_11 {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}

/// [`tower::Service`] adapter so a shared mux can serve as an axum fallback.
#[derive(Clone)]
pub struct MuxService {
    mux: Arc<DynamicMux>,
}

impl MuxService {
    pub fn new(mux: Arc<DynamicMux>) -> Self {
        Self { mux }
    }
}

impl Service<Request<Body>> for MuxService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mux = self.mux.clone();
        Box::pin(async move { Ok(mux.dispatch(req).await) })
    }
}
