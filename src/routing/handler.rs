//! Request handlers.
//!
//! # Responsibilities
//! - Define the [`Handler`] capability invoked by the dispatcher
//! - Adapt async closures into handlers
//! - Provide the builtin handlers the router synthesizes itself
//!   (redirects, not-found, fixed responses)
//!
//! # Design Decisions
//! - One method, object safe: handlers live behind `Arc<dyn Handler>`
//! - A handler owns the whole response; the dispatcher never alters it
//! - Returned futures are `'static` so no router state is borrowed
//!   while a handler runs

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

/// A callable that turns one request into one response.
pub trait Handler: Send + Sync + 'static {
    /// Produce the response for `req`.
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response>;
}

/// Handler shared between the route table and in-flight requests.
pub type SharedHandler = Arc<dyn Handler>;

/// Wraps an async closure as a [`Handler`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Create a handler from an async closure.
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFn<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    HandlerFn { f }
}

impl<F, Fut, R> Handler for HandlerFn<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        let fut = (self.f)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerFn")
    }
}

/// Replies with a redirect to a fixed location.
#[derive(Debug, Clone)]
pub struct Redirect {
    location: String,
    status: StatusCode,
}

impl Redirect {
    /// 301 Moved Permanently.
    pub fn permanent(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::MOVED_PERMANENTLY,
        }
    }

    /// 302 Found.
    pub fn temporary(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::FOUND,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn respond(&self, method: &Method) -> Response {
        let location = match HeaderValue::from_str(&self.location) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(location = %self.location, error = %e, "Redirect target is not a valid header value");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        // Only GET and HEAD get a body; other methods may not render it.
        if method == Method::GET || method == Method::HEAD {
            let body = format!(
                "<a href=\"{}\">{}</a>.\n",
                html_escape(&self.location),
                self.status.canonical_reason().unwrap_or("Redirect"),
            );
            (
                self.status,
                [
                    (header::LOCATION, location),
                    (header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8")),
                ],
                body,
            )
                .into_response()
        } else {
            (self.status, [(header::LOCATION, location)]).into_response()
        }
    }
}

impl Handler for Redirect {
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        let response = self.respond(req.method());
        Box::pin(async move { response })
    }
}

/// Replies `404 page not found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Handler for NotFound {
    fn call(&self, _req: Request<Body>) -> BoxFuture<'static, Response> {
        Box::pin(async {
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "404 page not found\n",
            )
                .into_response()
        })
    }
}

/// Replies with a fixed status, content type and body.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    status: StatusCode,
    content_type: HeaderValue,
    body: String,
}

impl StaticResponse {
    pub fn new(status: StatusCode, content_type: HeaderValue, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// 200 with a `text/plain` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(
            StatusCode::OK,
            HeaderValue::from_static("text/plain; charset=utf-8"),
            body,
        )
    }
}

impl Handler for StaticResponse {
    fn call(&self, _req: Request<Body>) -> BoxFuture<'static, Response> {
        let response = (
            self.status,
            [(header::CONTENT_TYPE, self.content_type.clone())],
            self.body.clone(),
        )
            .into_response();
        Box::pin(async move { response })
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
