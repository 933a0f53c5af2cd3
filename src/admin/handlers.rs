use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::RouteConfig;
use crate::routing::{ProvisionError, RouteError};

#[derive(Serialize, Deserialize, Debug)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub routes: usize,
    pub hosts: bool,
}

#[derive(Deserialize)]
pub struct PatternQuery {
    pub pattern: String,
}

/// A provisioning failure rendered as `{"error": "..."}`.
pub struct ApiError(ProvisionError);

impl From<ProvisionError> for ApiError {
    fn from(e: ProvisionError) -> Self {
        Self(e)
    }
}

impl From<RouteError> for ApiError {
    fn from(e: RouteError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ProvisionError::Route(RouteError::DuplicateRegistration(_)) => StatusCode::CONFLICT,
            ProvisionError::Route(RouteError::UnknownPattern(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        routes: state.mux.patterns().len(),
        hosts: state.mux.has_hosts(),
    })
}

pub async fn list_routes(State(state): State<AdminState>) -> Json<Vec<String>> {
    Json(state.mux.patterns())
}

pub async fn register_route(
    State(state): State<AdminState>,
    Json(route): Json<RouteConfig>,
) -> Result<(StatusCode, Json<RouteConfig>), ApiError> {
    state.factory.register(&state.mux, &route)?;
    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn deregister_route(
    State(state): State<AdminState>,
    Query(query): Query<PatternQuery>,
) -> Result<StatusCode, ApiError> {
    state.mux.deregister(&query.pattern)?;
    Ok(StatusCode::NO_CONTENT)
}
