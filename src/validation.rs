use chrono::NaiveDate;

use crate::errors::{IntakeError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fail with every empty field listed by label, in the order given.
pub fn require_fields(fields: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(IntakeError::validation(format!(
            "Please fill in the mandatory fields: {}",
            missing.join(", ")
        )))
    }
}

pub fn validate_date(label: &str, value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| IntakeError::validation(format!("{} must be in YYYY-MM-DD format.", label)))
}

/// Blank dates count as absent.
pub fn optional_date(label: &str, value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(date) => {
            validate_date(label, date)?;
            Ok(Some(date.to_string()))
        }
        None => Ok(None),
    }
}
