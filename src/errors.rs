use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::api::errors::normalize_error;

#[derive(Debug, Error)]
pub enum IntakeError {
    // Missing or unusable settings; stays broken until restart
    #[error("{0}")]
    Configuration(String),

    // Bad input from the caller (missing field, malformed date)
    #[error("{0}")]
    Validation(String),

    #[error("Jira API error ({}): {}", .0.status, .0.message)]
    Remote(RemoteRequestError),

    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    #[error("Failed to parse Jira response: {0}")]
    Decode(String),
}

/// A non-2xx answer from Jira, with the message already pulled out of the body.
#[derive(Debug, Clone)]
pub struct RemoteRequestError {
    pub status: StatusCode,
    pub message: String,
    pub raw_body: String,
    /// The body parsed as JSON, when it was JSON at all.
    pub body: Option<Value>,
}

impl RemoteRequestError {
    pub fn from_response(status: StatusCode, raw_body: String) -> Self {
        let (message, body) = normalize_error(status, &raw_body);
        Self {
            status,
            message,
            raw_body,
            body,
        }
    }
}

impl IntakeError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        IntakeError::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        IntakeError::Validation(msg.into())
    }

    /// The human-readable message without any status prefix.
    pub fn message(&self) -> String {
        match self {
            IntakeError::Remote(remote) => remote.message.clone(),
            other => other.to_string(),
        }
    }

    /// Terminal hint shown under the error by the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            IntakeError::Configuration(_) => {
                Some("Check config/jira_config.yml or the JIRA_INTAKE__JIRA__* environment variables")
            }
            IntakeError::Validation(_) => Some("Dates must be in YYYY-MM-DD format"),
            IntakeError::Remote(remote)
                if remote.status == StatusCode::UNAUTHORIZED
                    || remote.status == StatusCode::FORBIDDEN =>
            {
                Some("Your API token may have expired or is invalid: https://id.atlassian.com/manage-profile/security/api-tokens")
            }
            IntakeError::Remote(remote) if remote.status == StatusCode::NOT_FOUND => {
                Some("The issue doesn't exist or you don't have access to it")
            }
            IntakeError::Network { .. } => Some("Check your connection and that base_url is reachable"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IntakeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IntakeError::Decode(err.to_string())
        } else {
            IntakeError::Network {
                message: err.to_string(),
                timed_out: err.is_timeout(),
            }
        }
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        IntakeError::Decode(err.to_string())
    }
}

impl From<::config::ConfigError> for IntakeError {
    fn from(err: ::config::ConfigError) -> Self {
        IntakeError::Configuration(format!("Invalid Jira configuration: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display_uses_normalized_message() {
        let err = IntakeError::Remote(RemoteRequestError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"errorMessages":["summary is required"]}"#.to_string(),
        ));
        assert_eq!(err.to_string(), "Jira API error (400 Bad Request): summary is required");
        assert_eq!(err.message(), "summary is required");
    }

    #[test]
    fn test_remote_error_keeps_raw_body() {
        let remote = RemoteRequestError::from_response(StatusCode::BAD_GATEWAY, "<html>".to_string());
        assert_eq!(remote.raw_body, "<html>");
        assert!(remote.body.is_none());
        assert_eq!(remote.message, "502 Bad Gateway");
    }

    #[test]
    fn test_hint_for_auth_failure() {
        let err = IntakeError::Remote(RemoteRequestError::from_response(
            StatusCode::UNAUTHORIZED,
            String::new(),
        ));
        assert!(err.hint().unwrap().contains("api-tokens"));
    }

    #[test]
    fn test_validation_message_is_plain() {
        let err = IntakeError::validation("Start Date must be in YYYY-MM-DD format.");
        assert_eq!(err.message(), "Start Date must be in YYYY-MM-DD format.");
        assert!(err.hint().is_some());
    }
}
