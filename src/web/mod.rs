//! HTTP front-end: the ticket form endpoint plus a small JSON API.

mod handlers;

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use crate::api::jira::JiraGateway;
use crate::config::settings::Settings;
use crate::errors::{IntakeError, Result};

/// Shared application state.
///
/// The gateway is built once at startup. If that failed, the configuration
/// error is kept and handed back on every request until the process restarts.
#[derive(Clone)]
pub struct AppState {
    gateway: std::result::Result<Arc<JiraGateway>, String>,
}

impl AppState {
    pub fn new(gateway: Result<JiraGateway>) -> Self {
        Self {
            gateway: gateway.map(Arc::new).map_err(|e| e.message()),
        }
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::new(Settings::load(path).and_then(JiraGateway::new))
    }

    pub fn gateway(&self) -> Result<Arc<JiraGateway>> {
        self.gateway.clone().map_err(IntakeError::Configuration)
    }

    pub fn config_error(&self) -> Option<&str> {
        self.gateway.as_ref().err().map(String::as_str)
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::create_ticket))
        .route("/api/issues", axum::routing::post(handlers::create_issue))
        .route(
            "/api/issues/{key}",
            get(handlers::get_issue).put(handlers::update_issue),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

impl IntakeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::Remote(remote) => remote.status,
            IntakeError::Network { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            IntakeError::Network { .. } | IntakeError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn details(&self) -> Value {
        match self {
            IntakeError::Remote(remote) => remote.body.clone().unwrap_or_else(|| json!({})),
            _ => json!({}),
        }
    }

    /// JSON error response with `message` in place of the error's own text.
    pub fn into_response_with(self, message: String) -> Response {
        let body = json!({ "error": message, "details": self.details() });
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for IntakeError {
    fn from(rejection: JsonRejection) -> Self {
        IntakeError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for IntakeError {
    fn from(rejection: FormRejection) -> Self {
        IntakeError::Validation(rejection.body_text())
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let message = self.message();
        self.into_response_with(message)
    }
}
