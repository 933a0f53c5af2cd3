//! Upstream forwarding handler.
//!
//! # Responsibilities
//! - Rewrite the request URI to point at the upstream
//! - Forward method, headers and body unchanged
//! - Stream the upstream response back to the client
//!
//! # Design Decisions
//! - One attempt per request; the router does not retry
//! - Upstream failures map to 502 Bad Gateway
//! - The client is shared by every proxy route (pooled connections)

use axum::{
    body::Body,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::routing::Handler;

/// HTTP client used for upstream requests.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Build the shared upstream client.
pub fn upstream_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Forwards every request it receives to one upstream.
#[derive(Clone)]
pub struct Proxy {
    upstream: Authority,
    client: UpstreamClient,
}

impl Proxy {
    pub fn new(upstream: Authority, client: UpstreamClient) -> Self {
        Self { upstream, client }
    }

    pub fn upstream(&self) -> &Authority {
        &self.upstream
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy").field("upstream", &self.upstream).finish()
    }
}

impl Handler for Proxy {
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        let client = self.client.clone();
        let upstream = self.upstream.clone();
        Box::pin(forward(client, upstream, req))
    }
}

async fn forward(client: UpstreamClient, upstream: Authority, req: Request<Body>) -> Response {
    let (mut parts, body) = req.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %upstream, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };

    tracing::debug!(upstream = %upstream, uri = %parts.uri, "Forwarding request");

    match client.request(Request::from_parts(parts, body)).await {
        Ok(response) => response.map(Body::new),
        Err(e) => {
            tracing::error!(upstream = %upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
