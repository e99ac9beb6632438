use axum::{
    body::Bytes,
    extract::{
        rejection::{FormRejection, JsonRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::AppState;
use crate::errors::{IntakeError, Result};
use crate::models::ticket::IssueRequest;
use crate::validation::{optional_date, require_fields, validate_date};

#[derive(Debug, Default, Deserialize)]
pub struct TicketForm {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub due_date: String,
}

/// Landing endpoint: reports whether the Jira configuration loaded.
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    match state.config_error() {
        None => Json(json!({ "status": "ready" })),
        Some(error) => Json(json!({ "status": "misconfigured", "config_error": error })),
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle the ticket form.
///
/// Every field is mandatory and both dates must be `YYYY-MM-DD`. The dates are
/// also written into the description so they survive without a custom field.
pub async fn create_ticket(
    State(state): State<AppState>,
    form: std::result::Result<Form<TicketForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return IntakeError::from(rejection).into_response(),
    };

    let summary = form.summary.trim();
    let details = form.details.trim();
    let start_date = form.start_date.trim();
    let due_date = form.due_date.trim();

    let checked = require_fields(&[
        ("Summary", summary),
        ("Details", details),
        ("Start Date", start_date),
        ("Expected By Date", due_date),
    ])
    .and_then(|_| validate_date("Start Date", start_date))
    .and_then(|_| validate_date("Expected By Date", due_date))
    .and_then(|_| state.gateway());

    let gateway = match checked {
        Ok(gateway) => gateway,
        Err(err) => return err.into_response(),
    };

    let description = [
        "Details:".to_string(),
        details.to_string(),
        String::new(),
        format!("Start Date: {}", start_date),
        format!("Expected By: {}", due_date),
    ]
    .join("\n");

    let request = IssueRequest::new(summary, description)
        .with_start_date(start_date)
        .with_due_date(due_date);

    match gateway.create_issue(&request).await {
        Ok(issue) => {
            let key = issue.get("key").and_then(Value::as_str).unwrap_or_default();
            info!(issue_key = %key, "Created Jira issue from form");
            (
                StatusCode::CREATED,
                Json(json!({
                    "key": key,
                    "message": format!("Successfully created Jira issue {}.", key),
                })),
            )
                .into_response()
        }
        Err(err) => {
            warn!(error = %err, "Form issue creation failed");
            let message = format!("Failed to create issue: {}", err.message());
            err.into_response_with(message)
        }
    }
}

/// Create an issue from a JSON body. Only `summary` is mandatory.
pub async fn create_issue(
    State(state): State<AppState>,
    request: std::result::Result<Json<IssueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(mut request) = request?;
    require_fields(&[("Summary", request.summary.as_str())])?;
    request.start_date = optional_date("Start Date", request.start_date.as_deref())?;
    request.due_date = optional_date("Due Date", request.due_date.as_deref())?;

    let issue = state.gateway()?.create_issue(&request).await?;

    let key = issue.get("key").and_then(Value::as_str).unwrap_or_default();
    info!(issue_key = %key, "Created Jira issue");

    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>> {
    let issue = state.gateway()?.get_issue(&key).await?;
    Ok(Json(issue))
}

/// Update an issue. Accepts either `{"fields": {...}}` or a bare field map;
/// an empty body counts as no fields.
pub async fn update_issue(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| IntakeError::validation(format!("Invalid JSON body: {}", e)))?
    };

    let fields = match payload {
        Value::Object(mut object) => match object.remove("fields") {
            Some(Value::Object(fields)) => fields,
            Some(_) => return Err(IntakeError::validation("\"fields\" must be a JSON object")),
            None => object,
        },
        Value::Null => Default::default(),
        _ => return Err(IntakeError::validation("Request body must be a JSON object")),
    };

    let gateway = state.gateway()?;
    let outcome = gateway.update_issue(&key, fields).await?;

    info!(issue_key = %key, "Updated Jira issue");

    Ok(Json(outcome.into_json()))
}
