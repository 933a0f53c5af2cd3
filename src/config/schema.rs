//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the router service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MuxConfig {
    /// Listener configuration for routed traffic.
    pub listener: ListenerConfig,

    /// Routes installed at startup and reconciled on reload.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A pattern and the handler serving it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Exact (`/a`), subtree (`/a/`) or host-qualified (`host/a/`) pattern.
    pub pattern: String,

    /// Handler definition. Missing handlers are rejected at registration.
    #[serde(default)]
    pub handler: Option<HandlerConfig>,
}

/// Declarative handler definitions.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerConfig {
    /// Fixed response.
    Static {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        body: String,
        #[serde(default = "default_content_type")]
        content_type: String,
    },

    /// Redirect to a fixed location.
    Redirect {
        location: String,
        #[serde(default = "default_permanent")]
        permanent: bool,
    },

    /// Forward to an upstream `host:port` over HTTP.
    Proxy { upstream: String },
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}

fn default_permanent() -> bool {
    true
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: MuxConfig = toml::from_str("").unwrap();
        assert_eq!(config, MuxConfig::default());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_parse_routes() {
        let config: MuxConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[routes]]
            pattern = "/status/"
            handler = { type = "static", body = "ok" }

            [[routes]]
            pattern = "/old"
            handler = { type = "redirect", location = "/new", permanent = false }

            [[routes]]
            pattern = "api.example.com/v1/"
            handler = { type = "proxy", upstream = "127.0.0.1:3000" }

            [[routes]]
            pattern = "/broken"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.routes.len(), 4);
        assert_eq!(
            config.routes[0].handler,
            Some(HandlerConfig::Static {
                status: 200,
                body: "ok".into(),
                content_type: "text/plain; charset=utf-8".into(),
            })
        );
        assert_eq!(
            config.routes[1].handler,
            Some(HandlerConfig::Redirect {
                location: "/new".into(),
                permanent: false,
            })
        );
        assert_eq!(
            config.routes[2].handler,
            Some(HandlerConfig::Proxy {
                upstream: "127.0.0.1:3000".into(),
            })
        );
        assert_eq!(config.routes[3].handler, None);
    }

    #[test]
    fn test_route_config_json() {
        let route: RouteConfig = serde_json::from_str(
            r#"{"pattern": "/a", "handler": {"type": "static", "status": 204}}"#,
        )
        .unwrap();
        assert_eq!(route.pattern, "/a");
        assert!(matches!(route.handler, Some(HandlerConfig::Static { status: 204, .. })));
    }
}
