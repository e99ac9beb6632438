pub mod errors;
pub mod jira;
