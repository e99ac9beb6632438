use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::settings::{Settings, StartDateFallback};
use crate::errors::{IntakeError, RemoteRequestError, Result};
use crate::models::adf::ensure_document;
use crate::models::ticket::{Description, IssueRequest, UpdateOutcome};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create/read/update access to Jira issues for one configured project.
///
/// Holds a single pooled `reqwest::Client`, so one instance can be shared
/// (behind an `Arc`) by every request handler.
#[derive(Clone)]
pub struct JiraGateway {
    client: Client,
    settings: Settings,
}

impl JiraGateway {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn create_issue(&self, request: &IssueRequest) -> Result<Value> {
        let url = self.url("/rest/api/3/issue");
        let payload = json!({ "fields": self.create_fields(request) });

        debug!(url = %url, summary = %request.summary, "Creating Jira issue");

        let response = self.client.post(&url).json(&payload).send().await?;
        parse_json(response).await
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<Value> {
        let url = self.issue_url(issue_key);

        debug!(url = %url, "Fetching Jira issue");

        let response = self.client.get(&url).send().await?;
        parse_json(response).await
    }

    pub async fn update_issue(
        &self,
        issue_key: &str,
        mut fields: Map<String, Value>,
    ) -> Result<UpdateOutcome> {
        if let Some(description) = fields.remove("description") {
            fields.insert("description".to_string(), ensure_document(description));
        }

        let url = self.issue_url(issue_key);

        debug!(url = %url, fields = fields.len(), "Updating Jira issue");

        let response = self
            .client
            .put(&url)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let text = success_text(response).await?;
        if text.trim().is_empty() {
            return Ok(UpdateOutcome::Success);
        }
        Ok(UpdateOutcome::Issue(serde_json::from_str(&text)?))
    }

    fn create_fields(&self, request: &IssueRequest) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("project".into(), json!({ "key": self.settings.project_key }));
        fields.insert("summary".into(), Value::String(request.summary.clone()));
        fields.insert("issuetype".into(), json!({ "name": self.settings.issue_type }));

        if let Some(due_date) = request.due_date.as_deref().filter(|d| !d.is_empty()) {
            fields.insert("duedate".into(), Value::String(due_date.to_string()));
        }

        let mut description = request.description.clone();

        if let Some(start_date) = request.start_date.as_deref().filter(|d| !d.is_empty()) {
            match (&self.settings.start_date_field_id, self.settings.start_date_fallback) {
                (Some(field_id), _) => {
                    fields.insert(field_id.clone(), Value::String(start_date.to_string()));
                }
                (None, StartDateFallback::Prepend) => {
                    description = prepend_start_date(description, start_date);
                }
                (None, StartDateFallback::Drop) => {
                    debug!(start_date, "No start date field configured, dropping start date");
                }
            }
        }

        fields.insert("description".into(), ensure_document(description.into_value()));
        fields
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    fn issue_url(&self, issue_key: &str) -> String {
        self.url(&format!("/rest/api/3/issue/{}", urlencoding::encode(issue_key)))
    }
}

fn prepend_start_date(description: Description, start_date: &str) -> Description {
    match description {
        Description::Text(text) if text.is_empty() => {
            Description::Text(format!("Start Date: {}", start_date))
        }
        Description::Text(text) => Description::Text(format!("Start Date: {}\n{}", start_date, text)),
        document @ Description::Document(_) => {
            warn!(start_date, "Cannot prepend start date to a structured description, dropping it");
            document
        }
    }
}

fn build_http_client(settings: &Settings) -> Result<Client> {
    let mut auth = HeaderValue::from_str(&format!("Basic {}", settings.auth_header()))
        .map_err(|e| IntakeError::configuration(format!("Invalid Jira credentials: {}", e)))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| IntakeError::configuration(format!("Failed to build HTTP client: {}", e)))
}

async fn parse_json(response: Response) -> Result<Value> {
    let text = success_text(response).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Body of a 2xx response, or the normalized remote error for anything else.
async fn success_text(response: Response) -> Result<String> {
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let remote = RemoteRequestError::from_response(status, text);
        warn!(status = %status, message = %remote.message, "Jira API request failed");
        return Err(IntakeError::Remote(remote));
    }

    Ok(response.text().await?)
}
