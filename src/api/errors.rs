use reqwest::StatusCode;
use serde_json::Value;

/// Pull a readable message out of a Jira error body.
///
/// Jira answers failures with `{"errorMessages": [...], "errors": {...}}`.
/// `errorMessages` wins unless it is missing or empty, then `errors`. Bodies
/// that are not JSON objects fall back to the status line, e.g. `400 Bad Request`.
///
/// Returns the message plus the body parsed as JSON, if it parsed.
pub fn normalize_error(status: StatusCode, raw_body: &str) -> (String, Option<Value>) {
    let body = serde_json::from_str::<Value>(raw_body).ok();

    let message = body
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|object| {
            object
                .get("errorMessages")
                .filter(|v| is_truthy(v))
                .or_else(|| object.get("errors").filter(|v| is_truthy(v)))
        })
        .map(join_errors)
        .unwrap_or_else(|| status.to_string());

    (message, body)
}

fn join_errors(errors: &Value) -> String {
    match errors {
        Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join("; "),
        Value::Object(fields) => fields
            .iter()
            .map(|(field, error)| format!("{}: {}", field, plain(error)))
            .collect::<Vec<_>>()
            .join("; "),
        other => plain(other),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}
