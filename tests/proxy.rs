//! Forwarding to upstream servers.

mod common;

use reqwest::StatusCode;

use dynamic_mux::config::{HandlerConfig, RouteConfig};
use dynamic_mux::MuxConfig;

use common::{client, closed_port, start_mock_backend, start_server};

fn proxy_route(pattern: &str, upstream: std::net::SocketAddr) -> RouteConfig {
    RouteConfig {
        pattern: pattern.to_string(),
        handler: Some(HandlerConfig::Proxy {
            upstream: upstream.to_string(),
        }),
    }
}

#[tokio::test]
async fn test_forwards_path_and_query() {
    let users = start_mock_backend("users").await;
    let orders = start_mock_backend("orders").await;

    let mut config = MuxConfig::default();
    config.routes = vec![proxy_route("/users/", users), proxy_route("/orders/", orders)];
    let server = start_server(config).await;
    let client = client();

    let res = client.get(server.url("/users/42?full=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "users /users/42?full=1");

    let res = client.get(server.url("/orders/7")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "orders /orders/7");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let dead = closed_port().await;

    let mut config = MuxConfig::default();
    config.routes = vec![proxy_route("/dead/", dead)];
    let server = start_server(config).await;

    let res = client().get(server.url("/dead/x")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    server.shutdown.trigger();
}
