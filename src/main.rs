use clap::{Parser, Subcommand};
use colored::*;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod errors;
mod models;
mod validation;
mod web;

use crate::config::settings::{Settings, DEFAULT_CONFIG_PATH};
use crate::errors::IntakeError;

#[derive(Parser)]
#[command(name = "jira-intake")]
#[command(version = "0.1.0")]
#[command(about = "File Jira issues from a web form, a JSON API or the terminal", long_about = None)]
struct Cli {
    /// for debugging purposes
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the Jira configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true, env = "JIRA_INTAKE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web front-end
    Serve {
        #[arg(long, default_value = "0.0.0.0:8505")]
        bind: SocketAddr,
    },

    /// Create an issue
    Create {
        #[arg(long)]
        summary: String,

        /// Plain text; blank lines start new paragraphs
        #[arg(long, default_value = "")]
        details: String,

        /// YYYY-MM-DD
        #[arg(long)]
        start_date: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        due_date: Option<String>,
    },

    /// Show an issue
    Get {
        /// (e.g., OPS-1234)
        key: String,

        /// Output the raw issue JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields on an issue
    Update {
        key: String,

        #[arg(long)]
        summary: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        due_date: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display current configuration (with masked secrets)
    Show,

    /// Get the path to the config file
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let quiet = matches!(cli.command, Commands::Get { json: true, .. });
    if !quiet {
        println!("{}", "jira-intake v0.1.0".bright_cyan().bold());
        println!();
    }

    let result = match cli.command {
        Commands::Serve { bind } => handle_serve(&cli.config, bind).await,

        Commands::Create {
            summary,
            details,
            start_date,
            due_date,
        } => handle_create(&cli.config, &summary, &details, start_date.as_deref(), due_date.as_deref()).await,

        Commands::Get { key, json } => handle_get(&cli.config, &key, json).await,

        Commands::Update {
            key,
            summary,
            description,
            due_date,
        } => {
            handle_update(&cli.config, &key, summary, description, due_date.as_deref()).await
        }

        Commands::Config { action } => handle_config(&cli.config, action),
    };

    if let Err(e) = result {
        print_error(&e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "jira_intake=debug" } else { "jira_intake=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_error(err: &anyhow::Error) {
    eprintln!();
    match err.downcast_ref::<IntakeError>() {
        Some(intake) => {
            eprintln!("{}", intake.to_string().red().bold());
            if let Some(hint) = intake.hint() {
                eprintln!("   {}", hint.dimmed());
            }
        }
        None => eprintln!("{}", format!("{:#}", err).red().bold()),
    }
}

fn gateway(config_path: &Path) -> anyhow::Result<api::jira::JiraGateway> {
    let settings = Settings::load(config_path)?;
    Ok(api::jira::JiraGateway::new(settings)?)
}

async fn handle_serve(config_path: &Path, bind: SocketAddr) -> anyhow::Result<()> {
    use anyhow::Context;
    use tracing::{info, warn};

    let state = web::AppState::from_config(config_path);
    if let Some(error) = state.config_error() {
        warn!(error = %error, "Jira configuration is invalid, requests will fail until restart");
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!(%bind, "Serving ticket form");
    println!("{}", format!("Listening on http://{}", bind).green());

    axum::serve(listener, web::build_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn handle_create(
    config_path: &Path,
    summary: &str,
    details: &str,
    start_date: Option<&str>,
    due_date: Option<&str>,
) -> anyhow::Result<()> {
    validation::require_fields(&[("Summary", summary)])?;
    let start_date = validation::optional_date("Start Date", start_date)?;
    let due_date = validation::optional_date("Due Date", due_date)?;

    let jira = gateway(config_path)?;

    let mut request = models::ticket::IssueRequest::new(summary, details);
    request.start_date = start_date;
    request.due_date = due_date;

    println!("{}", "  Creating Jira issue...".dimmed());
    let issue = jira.create_issue(&request).await?;

    let key = issue.get("key").and_then(Value::as_str).unwrap_or("?");

    println!();
    println!("{}", "✓ Issue created!".green().bold());
    println!("  {} {}", "Key:".bold(), key.bright_white());
    println!(
        "  {} {}/browse/{}",
        "URL:".bold(),
        jira.settings().base_url,
        key
    );

    Ok(())
}

async fn handle_get(config_path: &Path, key: &str, json_output: bool) -> anyhow::Result<()> {
    let jira = gateway(config_path)?;
    let issue = jira.get_issue(key).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&issue)?);
        return Ok(());
    }

    let ticket = models::ticket::JiraTicket::from_value(&issue);

    println!("  {} {}", "Key:".bold(), ticket.key.bright_white());
    println!("  {} {}", "Summary:".bold(), ticket.fields.summary.bright_white());

    if let Some(status) = &ticket.fields.status {
        println!("  {} {}", "Status:".bold(), status.name.yellow());
    }

    if let Some(assignee) = &ticket.fields.assignee {
        println!("  {} {}", "Assignee:".bold(), assignee.display_name.bright_white());
    }

    if let Some(due) = &ticket.fields.duedate {
        println!("  {} {}", "Due:".bold(), due.bright_white());
    }

    if let Some(description) = ticket.description_text() {
        println!();
        for line in description.lines() {
            println!("  {}", line.dimmed());
        }
    }

    Ok(())
}

async fn handle_update(
    config_path: &Path,
    key: &str,
    summary: Option<String>,
    description: Option<String>,
    due_date: Option<&str>,
) -> anyhow::Result<()> {
    let fields = build_update_fields(summary, description, due_date)?;
    let jira = gateway(config_path)?;

    println!("{}", format!("  Updating {}...", key).dimmed());
    jira.update_issue(key, fields).await?;

    println!("{}", format!("✓ {} updated", key).green().bold());
    Ok(())
}

fn build_update_fields(
    summary: Option<String>,
    description: Option<String>,
    due_date: Option<&str>,
) -> anyhow::Result<Map<String, Value>> {
    let mut fields = Map::new();

    if let Some(summary) = summary {
        fields.insert("summary".into(), Value::String(summary));
    }
    if let Some(description) = description {
        fields.insert("description".into(), Value::String(description));
    }
    if let Some(due) = validation::optional_date("Due Date", due_date)? {
        fields.insert("duedate".into(), Value::String(due));
    }

    if fields.is_empty() {
        return Err(IntakeError::validation(
            "Nothing to update: pass --summary, --description or --due-date",
        )
        .into());
    }

    Ok(fields)
}

fn handle_config(config_path: &Path, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load(config_path)?;

            println!("{}", "Current Configuration".cyan().bold());
            println!();

            println!("{}", "[jira]".bold());
            println!("  {} {}", "base_url:".dimmed(), settings.base_url.bright_white());
            println!("  {} {}", "email:".dimmed(), settings.email.bright_white());
            println!("  {} {}", "api_token:".dimmed(), settings.masked_token().yellow());
            println!("  {} {}", "project_key:".dimmed(), settings.project_key.bright_white());
            println!("  {} {}", "issue_type:".dimmed(), settings.issue_type.bright_white());
            println!(
                "  {} {}",
                "start_date_field_id:".dimmed(),
                settings
                    .start_date_field_id
                    .as_deref()
                    .unwrap_or("(none)")
                    .bright_white()
            );
            println!(
                "  {} {:?}",
                "start_date_fallback:".dimmed(),
                settings.start_date_fallback
            );
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["jira-intake", "serve"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config/jira_config.yml"));
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind.port(), 8505),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_create_args() {
        let cli = Cli::try_parse_from([
            "jira-intake",
            "--config",
            "/etc/jira.toml",
            "create",
            "--summary",
            "Printer on fire",
            "--due-date",
            "2024-05-01",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/jira.toml"));
        match cli.command {
            Commands::Create { summary, details, start_date, due_date } => {
                assert_eq!(summary, "Printer on fire");
                assert_eq!(details, "");
                assert!(start_date.is_none());
                assert_eq!(due_date.as_deref(), Some("2024-05-01"));
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_build_update_fields() {
        let fields = build_update_fields(Some("renamed".into()), None, Some("2024-05-01")).unwrap();
        assert_eq!(fields["summary"], "renamed");
        assert_eq!(fields["duedate"], "2024-05-01");
        assert!(!fields.contains_key("description"));
    }

    #[test]
    fn test_build_update_fields_rejects_bad_date() {
        let err = build_update_fields(None, None, Some("2024/05/01")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IntakeError>(),
            Some(IntakeError::Validation(_))
        ));
    }

    #[test]
    fn test_build_update_fields_requires_something() {
        assert!(build_update_fields(None, None, None).is_err());
    }
}
