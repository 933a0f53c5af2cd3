//! Declarative route provisioning.
//!
//! # Responsibilities
//! - Build handlers from [`HandlerConfig`] definitions
//! - Install a set of configured routes into a mux
//! - Reconcile the mux when the configured route set changes
//!
//! # Design Decisions
//! - A changed route is deregistered and registered again under one
//!   write lock, so it never disappears mid-reload
//! - Only patterns named by the previous or next config are touched;
//!   routes added through the admin API survive a reload
//! - Reconciliation keeps going after a failed route and reports it

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{uri::Authority, HeaderValue, StatusCode};
use thiserror::Error;

use super::error::RouteError;
use super::handler::{Redirect, SharedHandler, StaticResponse};
use super::mux::DynamicMux;
use crate::config::schema::{HandlerConfig, RouteConfig};
use crate::http::proxy::{upstream_client, Proxy, UpstreamClient};

/// Errors raised while turning a [`RouteConfig`] into a live route.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("invalid upstream {upstream:?}: {reason}")]
    InvalidUpstream { upstream: String, reason: String },

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("invalid content type {0:?}")]
    InvalidContentType(String),
}

/// Builds handlers from declarative definitions.
#[derive(Clone)]
pub struct HandlerFactory {
    client: UpstreamClient,
}

impl HandlerFactory {
    pub fn new() -> Self {
        Self {
            client: upstream_client(),
        }
    }

    /// Build the handler for `config`.
    pub fn build(&self, config: &HandlerConfig) -> Result<SharedHandler, ProvisionError> {
        let handler: SharedHandler = match config {
            HandlerConfig::Static {
                status,
                body,
                content_type,
            } => {
                let status =
                    StatusCode::from_u16(*status).map_err(|_| ProvisionError::InvalidStatus(*status))?;
                let content_type = HeaderValue::from_str(content_type)
                    .map_err(|_| ProvisionError::InvalidContentType(content_type.clone()))?;
                Arc::new(StaticResponse::new(status, content_type, body.clone()))
            }
            HandlerConfig::Redirect { location, permanent } => {
                if *permanent {
                    Arc::new(Redirect::permanent(location.clone()))
                } else {
                    Arc::new(Redirect::temporary(location.clone()))
                }
            }
            HandlerConfig::Proxy { upstream } => {
                let authority: Authority =
                    upstream
                        .parse()
                        .map_err(|e: axum::http::uri::InvalidUri| ProvisionError::InvalidUpstream {
                            upstream: upstream.clone(),
                            reason: e.to_string(),
                        })?;
                Arc::new(Proxy::new(authority, self.client.clone()))
            }
        };
        Ok(handler)
    }

    /// Register `route` on `mux`. A route without a handler fails with
    /// [`RouteError::NilHandler`].
    pub fn register(&self, mux: &DynamicMux, route: &RouteConfig) -> Result<(), ProvisionError> {
        let handler = route.handler.as_ref().map(|h| self.build(h)).transpose()?;
        mux.register_shared(&route.pattern, handler)?;
        Ok(())
    }
}

impl Default for HandlerFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Register every route in `routes`, stopping at the first failure.
pub fn install_routes(
    mux: &DynamicMux,
    factory: &HandlerFactory,
    routes: &[RouteConfig],
) -> Result<(), ProvisionError> {
    for route in routes {
        factory.register(mux, route)?;
    }
    tracing::info!(count = routes.len(), "Configured routes installed");
    Ok(())
}

/// Outcome of [`sync_routes`].
#[derive(Debug, Default)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub replaced: usize,
    pub failed: Vec<(String, ProvisionError)>,
    /// Routes the configuration owns after the sync: the ones actually
    /// live in the mux with their configured handler. Pass this as
    /// `previous` on the next reload.
    pub routes: Vec<RouteConfig>,
}

/// Reconcile `mux` from the `previous` configured routes to `next`.
///
/// `previous` must only hold routes the configuration actually installed
/// (the `routes` of the last report), otherwise a pattern registered
/// elsewhere could be removed.
pub fn sync_routes(
    mux: &DynamicMux,
    factory: &HandlerFactory,
    previous: &[RouteConfig],
    next: &[RouteConfig],
) -> SyncReport {
    let mut report = SyncReport::default();
    let old: HashMap<&str, &RouteConfig> = previous.iter().map(|r| (r.pattern.as_str(), r)).collect();
    let new: HashMap<&str, &RouteConfig> = next.iter().map(|r| (r.pattern.as_str(), r)).collect();

    for (pattern, route) in &old {
        if new.contains_key(pattern) {
            continue;
        }
        match mux.deregister(pattern) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                tracing::warn!(pattern = %route.pattern, error = %e, "Failed to remove route on reload");
                report.failed.push((route.pattern.clone(), e.into()));
            }
        }
    }

    for route in next {
        match old.get(route.pattern.as_str()) {
            Some(existing) if *existing == route => report.routes.push(route.clone()),
            Some(existing) => {
                // Build first so a bad definition leaves the old route serving.
                let handler = match route.handler.as_ref().map(|h| factory.build(h)).transpose() {
                    Ok(handler) => handler,
                    Err(e) => {
                        report.failed.push((route.pattern.clone(), e));
                        report.routes.push((*existing).clone());
                        continue;
                    }
                };
                let result = match mux.replace(&route.pattern, handler.clone()) {
                    // Removed behind the config's back; install it afresh.
                    Err(RouteError::UnknownPattern(_)) => mux.register_shared(&route.pattern, handler),
                    other => other,
                };
                match result {
                    Ok(()) => {
                        report.replaced += 1;
                        report.routes.push(route.clone());
                    }
                    Err(e) => {
                        report.failed.push((route.pattern.clone(), e.into()));
                        report.routes.push((*existing).clone());
                    }
                }
            }
            None => match factory.register(mux, route) {
                Ok(()) => {
                    report.added += 1;
                    report.routes.push(route.clone());
                }
                Err(e) => report.failed.push((route.pattern.clone(), e)),
            },
        }
    }

    tracing::info!(
        added = report.added,
        removed = report.removed,
        replaced = report.replaced,
        failed = report.failed.len(),
        "Routes reconciled"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};

    fn static_route(pattern: &str, body: &str) -> RouteConfig {
        RouteConfig {
            pattern: pattern.to_string(),
            handler: Some(HandlerConfig::Static {
                status: 200,
                body: body.to_string(),
                content_type: "text/plain".to_string(),
            }),
        }
    }

    async fn body_of(mux: &DynamicMux, path: &str) -> String {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = mux.dispatch(req).await;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_build_handlers() {
        let factory = HandlerFactory::new();

        let handler = factory
            .build(&HandlerConfig::Redirect {
                location: "/new".into(),
                permanent: false,
            })
            .unwrap();
        let req = Request::builder().uri("/old").body(Body::empty()).unwrap();
        let response = handler.call(req).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/new");

        assert!(matches!(
            factory.build(&HandlerConfig::Static {
                status: 42,
                body: String::new(),
                content_type: "text/plain".into(),
            }),
            Err(ProvisionError::InvalidStatus(42))
        ));
        assert!(matches!(
            factory.build(&HandlerConfig::Proxy {
                upstream: "not a host".into()
            }),
            Err(ProvisionError::InvalidUpstream { .. })
        ));
        assert!(factory
            .build(&HandlerConfig::Proxy {
                upstream: "127.0.0.1:3000".into()
            })
            .is_ok());
    }

    #[test]
    fn test_register_without_handler() {
        let mux = DynamicMux::new();
        let factory = HandlerFactory::new();
        let route = RouteConfig {
            pattern: "/a".into(),
            handler: None,
        };
        assert!(matches!(
            factory.register(&mux, &route),
            Err(ProvisionError::Route(RouteError::NilHandler))
        ));
    }

    #[tokio::test]
    async fn test_sync_routes() {
        let mux = DynamicMux::new();
        let factory = HandlerFactory::new();
        let previous = vec![
            static_route("/keep", "keep"),
            static_route("/change", "v1"),
            static_route("/drop/", "drop"),
        ];
        install_routes(&mux, &factory, &previous).unwrap();
        mux.register_fn("/admin-added", |_req: Request<Body>| async { "admin" }).unwrap();

        let next = vec![
            static_route("/keep", "keep"),
            static_route("/change", "v2"),
            static_route("/new", "new"),
        ];
        let report = sync_routes(&mux, &factory, &previous, &next);
        assert_eq!(report.added, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.replaced, 1);
        assert!(report.failed.is_empty());

        assert_eq!(mux.patterns(), vec!["/admin-added", "/change", "/keep", "/new"]);
        assert_eq!(body_of(&mux, "/change").await, "v2");
        assert_eq!(body_of(&mux, "/admin-added").await, "admin");
    }

    #[tokio::test]
    async fn test_sync_keeps_old_route_when_replacement_is_invalid() {
        let mux = DynamicMux::new();
        let factory = HandlerFactory::new();
        let previous = vec![static_route("/a", "old")];
        install_routes(&mux, &factory, &previous).unwrap();

        let next = vec![RouteConfig {
            pattern: "/a".into(),
            handler: Some(HandlerConfig::Static {
                status: 1000,
                body: String::new(),
                content_type: "text/plain".into(),
            }),
        }];
        let report = sync_routes(&mux, &factory, &previous, &next);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(body_of(&mux, "/a").await, "old");
    }

    #[tokio::test]
    async fn test_sync_never_claims_admin_routes() {
        let mux = DynamicMux::new();
        let factory = HandlerFactory::new();
        mux.register_fn("/x", |_req: Request<Body>| async { "admin" }).unwrap();

        let report = sync_routes(&mux, &factory, &[], &[static_route("/x", "config")]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.routes.is_empty());

        let report = sync_routes(&mux, &factory, &report.routes, &[]);
        assert_eq!(report.removed, 0);
        assert_eq!(mux.patterns(), vec!["/x"]);
        assert_eq!(body_of(&mux, "/x").await, "admin");
    }

    #[tokio::test]
    async fn test_sync_reports_owned_routes() {
        let mux = DynamicMux::new();
        let factory = HandlerFactory::new();
        let previous = vec![static_route("/a", "old"), static_route("/b/", "b")];
        install_routes(&mux, &factory, &previous).unwrap();

        let bad = RouteConfig {
            pattern: "/a".into(),
            handler: Some(HandlerConfig::Static {
                status: 1000,
                body: String::new(),
                content_type: "text/plain".into(),
            }),
        };
        let next = vec![bad, static_route("/b/", "b2"), static_route("/c", "c")];
        let report = sync_routes(&mux, &factory, &previous, &next);

        assert_eq!(report.replaced, 1);
        assert_eq!(report.added, 1);
        assert_eq!(
            report.routes,
            vec![static_route("/a", "old"), static_route("/b/", "b2"), static_route("/c", "c")]
        );
        assert_eq!(mux.patterns(), vec!["/a", "/b", "/b/", "/c"]);
        assert_eq!(body_of(&mux, "/b/leaf").await, "b2");
    }

    #[tokio::test]
    async fn test_sync_reinstalls_route_removed_elsewhere() {
        let mux = DynamicMux::new();
        let factory = HandlerFactory::new();
        let previous = vec![static_route("/a", "v1")];
        install_routes(&mux, &factory, &previous).unwrap();
        mux.deregister("/a").unwrap();

        let report = sync_routes(&mux, &factory, &previous, &[static_route("/a", "v2")]);
        assert_eq!(report.replaced, 1);
        assert_eq!(body_of(&mux, "/a").await, "v2");
    }
}
