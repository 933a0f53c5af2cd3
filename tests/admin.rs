//! Admin API round trips against a live server.

mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use dynamic_mux::admin::serve_admin;
use dynamic_mux::{HttpServer, MuxConfig, Shutdown};

use common::client;

const KEY: &str = "integration-key";

#[tokio::test]
async fn test_admin_controls_live_routes() {
    let mut config = MuxConfig::default();
    config.admin.api_key = KEY.to_string();

    let server = HttpServer::new(config).unwrap();
    let state = server.admin_state();
    let shutdown = Shutdown::new();

    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let admin_task = tokio::spawn(serve_admin(state, admin_listener, shutdown.subscribe()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (_updates, rx) = tokio::sync::mpsc::unbounded_channel();
    let signal = shutdown.subscribe();
    let server_task = tokio::spawn(async move { server.run(listener, rx, signal).await });

    let client = client();
    let admin = format!("http://{}/admin", admin_addr);

    let res = client.get(format!("{}/status", admin)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/routes", admin))
        .bearer_auth(KEY)
        .json(&json!({
            "pattern": "/docs/",
            "handler": { "type": "static", "body": "docs" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/routes", admin))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    let patterns: Vec<String> = res.json().await.unwrap();
    assert_eq!(patterns, vec!["/docs", "/docs/"]);

    let res = client.get(format!("http://{}/docs/intro", addr)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "docs");

    let res = client
        .delete(format!("{}/routes", admin))
        .bearer_auth(KEY)
        .query(&[("pattern", "/docs/")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(format!("http://{}/docs/intro", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/routes", admin))
        .bearer_auth(KEY)
        .query(&[("pattern", "/docs/")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let error: Value = res.json().await.unwrap();
    assert_eq!(error["error"], "pattern was not registered: /docs/");

    let res = client
        .get(format!("{}/status", admin))
        .bearer_auth(KEY)
        .send()
        .await
        .unwrap();
    let status: Value = res.json().await.unwrap();
    assert_eq!(status["routes"], 0);
    assert_eq!(status["hosts"], false);

    shutdown.trigger();
    admin_task.await.unwrap().unwrap();
    server_task.await.unwrap().unwrap();
}
