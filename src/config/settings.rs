use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::path::Path;

use crate::errors::{IntakeError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/jira_config.yml";
pub const ENV_PREFIX: &str = "JIRA_INTAKE";

/// What to do with a start date when no custom field is configured for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartDateFallback {
    /// Leave it out of the request.
    #[default]
    Drop,
    /// Put a `Start Date: ...` line in front of a plain-text description.
    Prepend,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    pub issue_type: String,
    pub start_date_field_id: Option<String>,
    pub start_date_fallback: StartDateFallback,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    jira: RawJiraConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawJiraConfig {
    base_url: Option<String>,
    email: Option<String>,
    api_token: Option<String>,
    project_key: Option<String>,
    issue_type: Option<String>,
    start_date_field_id: Option<String>,
    #[serde(default)]
    start_date_fallback: StartDateFallback,
}

impl Settings {
    /// Load the `jira` section from `path`, with `JIRA_INTAKE__JIRA__*`
    /// environment variables layered on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IntakeError::configuration(format!(
                "Jira configuration file not found. Expected at {}",
                path.display()
            )));
        }

        let raw: ConfigFile = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw.jira)
    }

    fn from_raw(raw: RawJiraConfig) -> Result<Self> {
        let required = [
            ("base_url", &raw.base_url),
            ("email", &raw.email),
            ("api_token", &raw.api_token),
            ("project_key", &raw.project_key),
            ("issue_type", &raw.issue_type),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(IntakeError::configuration(format!(
                "Missing Jira configuration values: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            base_url: raw.base_url.unwrap_or_default().trim_end_matches('/').to_string(),
            email: raw.email.unwrap_or_default(),
            api_token: raw.api_token.unwrap_or_default(),
            project_key: raw.project_key.unwrap_or_default(),
            issue_type: raw.issue_type.unwrap_or_default(),
            start_date_field_id: raw.start_date_field_id.filter(|id| !id.trim().is_empty()),
            start_date_fallback: raw.start_date_fallback,
        })
    }

    /// `base64(email:api_token)`, for `Authorization: Basic ...`.
    pub fn auth_header(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.email, self.api_token))
    }

    /// Token with everything but the edges hidden, for display.
    pub fn masked_token(&self) -> String {
        let token = &self.api_token;
        if token.chars().count() <= 8 {
            return "***".to_string();
        }
        let head: String = token.chars().take(4).collect();
        let tail: String = token.chars().skip(token.chars().count() - 4).collect();
        format!("{}***{}", head, tail)
    }
}
