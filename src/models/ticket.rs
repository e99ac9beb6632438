use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::adf::document_to_text;

/// Issue description as the caller supplies it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    /// Pre-built ADF, sent as-is.
    Document(Value),
}

impl Description {
    pub fn into_value(self) -> Value {
        match self {
            Description::Text(text) => Value::String(text),
            Description::Document(doc) => doc,
        }
    }
}

impl Default for Description {
    fn default() -> Self {
        Description::Text(String::new())
    }
}

impl From<&str> for Description {
    fn from(text: &str) -> Self {
        Description::Text(text.to_string())
    }
}

impl From<String> for Description {
    fn from(text: String) -> Self {
        Description::Text(text)
    }
}

/// Fields needed to file a new issue. Dates are `YYYY-MM-DD` and are expected
/// to be validated by the caller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Description,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl IssueRequest {
    pub fn new(summary: impl Into<String>, description: impl Into<Description>) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            start_date: None,
            due_date: None,
        }
    }

    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn with_due_date(mut self, date: impl Into<String>) -> Self {
        self.due_date = Some(date.into());
        self
    }
}

/// Result of a PUT on an issue. Jira usually answers 204 with no body.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Issue(Value),
    Success,
}

impl UpdateOutcome {
    pub fn into_json(self) -> Value {
        match self {
            UpdateOutcome::Issue(value) => value,
            UpdateOutcome::Success => json!({ "status": "success" }),
        }
    }
}

/// Read-side view of the handful of issue fields the CLI prints.
/// Every field is optional; the raw issue JSON stays the source of truth.
#[derive(Debug, Default, Deserialize)]
pub struct JiraTicket {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: TicketFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub duedate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct User {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl JiraTicket {
    pub fn from_value(issue: &Value) -> Self {
        serde_json::from_value(issue.clone()).unwrap_or_default()
    }

    pub fn description_text(&self) -> Option<String> {
        self.fields
            .description
            .as_ref()
            .map(document_to_text)
            .filter(|text| !text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_accepts_text_or_document() {
        let text: Description = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(text, Description::Text("hello".to_string()));

        let doc = json!({"type": "doc", "version": 1, "content": []});
        let parsed: Description = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(parsed, Description::Document(doc));
    }

    #[test]
    fn test_issue_request_from_json() {
        let request: IssueRequest = serde_json::from_value(json!({
            "summary": "Printer on fire",
            "due_date": "2024-05-01"
        }))
        .unwrap();
        assert_eq!(request.summary, "Printer on fire");
        assert_eq!(request.description, Description::Text(String::new()));
        assert_eq!(request.due_date.as_deref(), Some("2024-05-01"));
        assert!(request.start_date.is_none());
    }

    #[test]
    fn test_update_outcome_success_marker() {
        assert_eq!(UpdateOutcome::Success.into_json(), json!({"status": "success"}));
    }

    #[test]
    fn test_ticket_view_tolerates_partial_issue() {
        let ticket = JiraTicket::from_value(&json!({
            "key": "OPS-7",
            "fields": {
                "summary": "Rotate keys",
                "status": {"name": "To Do"},
                "description": {
                    "type": "doc",
                    "version": 1,
                    "content": [{"type": "paragraph", "content": [{"type": "text", "text": "soon"}]}]
                }
            }
        }));
        assert_eq!(ticket.key, "OPS-7");
        assert_eq!(ticket.fields.status.as_ref().unwrap().name, "To Do");
        assert_eq!(ticket.description_text().as_deref(), Some("soon"));
        assert!(ticket.fields.assignee.is_none());
    }
}
