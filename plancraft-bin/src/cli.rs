use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use plancraft_agent::ChatAgent;
use plancraft_config::{ConfigLoader, PlanConfig, WarningSeverity, init_settings};
use plancraft_core::{PlanError, UserId};
use plancraft_llm::{GeminiProvider, LlmProvider};
use plancraft_server::AppState;
use plancraft_store::Store;

/// Plancraft: project planning with an LLM chat agent
#[derive(Parser)]
#[command(name = "plancraft", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to plancraft.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address, overriding server.listen
        #[arg(long)]
        listen: Option<String>,
    },
    /// Ask the chat agent one question as the given user
    Ask {
        /// Acting user id
        #[arg(short, long)]
        user: UserId,
        /// The question
        query: String,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the configuration for problems
    Doctor,
}

impl Cli {
    pub async fn run(self) -> plancraft_core::Result<()> {
        let config = init_settings(self.config.as_deref())?.clone();

        // --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug".to_string()
        } else if self.quiet {
            "error".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone())
        };
        init_tracing(&config.logging.format, &log_level);

        match self.command {
            Commands::Serve { listen } => cmd_serve(config, listen).await,
            Commands::Ask { user, query } => cmd_ask(config, user, &query).await,
            Commands::Config { json } => {
                cmd_config(config, &ConfigLoader::resolve_path(self.config.as_deref()), json)
            }
            Commands::Doctor => cmd_doctor(&config),
        }
    }
}

fn init_tracing(format: &str, level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// The hosted model provider, when a credential is configured.
fn provider(config: &PlanConfig) -> Option<Arc<dyn LlmProvider>> {
    let key = config.services.require_api_key().ok()?;
    Some(Arc::new(
        GeminiProvider::new(key.to_string()).with_base_url(config.services.api_base_url.clone()),
    ))
}

async fn cmd_serve(mut config: PlanConfig, listen: Option<String>) -> plancraft_core::Result<()> {
    if let Some(listen) = listen {
        config.server.listen = listen;
    }
    let warnings = config.validate().map_err(PlanError::Config)?;
    for w in warnings.iter().filter(|w| w.severity != WarningSeverity::Info) {
        warn!(field = %w.field, "{}", w.message);
    }

    let store = Store::open(&config.database.path)?;
    let llm = provider(&config);
    if llm.is_none() {
        warn!("no model API key configured; model-backed routes will return an error");
    }
    info!(
        db = %config.database.path.display(),
        model = %config.model.model,
        "plancraft starting"
    );

    let state = Arc::new(AppState::new(config, store, llm));
    plancraft_server::start_server(state).await
}

async fn cmd_ask(config: PlanConfig, user: UserId, query: &str) -> plancraft_core::Result<()> {
    config.services.require_api_key()?;
    let llm = provider(&config).ok_or_else(|| {
        PlanError::MissingCredential(plancraft_config::MISSING_API_KEY_MESSAGE.into())
    })?;
    let store = Store::open(&config.database.path)?;
    let agent = ChatAgent::from_config(&config, llm, Arc::new(store));

    let answer = agent.answer(query, user, &[]).await?;
    println!("{}", answer.output_text);
    if let Some(action) = answer.tool_action {
        println!("{}", serde_json::to_string(&action)?);
    }
    Ok(())
}

fn cmd_config(config: PlanConfig, path: &Path, json: bool) -> plancraft_core::Result<()> {
    let mut shown = config;
    shown.services.api_key = shown.services.masked_api_key();
    shown.server.api_key = shown.server.api_key.as_ref().map(|_| "****".to_string());

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("Config file: {}", path.display());
    println!();
    println!("[model]");
    println!("  model            = {}", shown.model.model);
    println!("  temperature      = {}", shown.model.temperature);
    println!("  agent_temperature = {}", shown.model.agent_temperature);
    println!("  max_tokens       = {}", shown.model.max_tokens);
    println!("  max_iterations   = {}", shown.model.max_iterations);
    println!("[database]");
    println!("  path             = {}", shown.database.path.display());
    println!("[server]");
    println!("  listen           = {}", shown.server.listen);
    println!("  cors             = {}", shown.server.cors);
    println!("  user_header      = {}", shown.server.user_header);
    println!(
        "  api_key          = {}",
        shown.server.api_key.as_deref().unwrap_or("(none)")
    );
    println!("[logging]");
    println!("  level            = {}", shown.logging.level);
    println!("  format           = {}", shown.logging.format);
    println!("[services]");
    println!(
        "  api_key          = {}",
        shown.services.api_key.as_deref().unwrap_or("(none)")
    );
    println!("  api_base_url     = {}", shown.services.api_base_url);
    Ok(())
}

fn cmd_doctor(config: &PlanConfig) -> plancraft_core::Result<()> {
    match config.validate() {
        Ok(warnings) if warnings.is_empty() => {
            println!("No problems found.");
            Ok(())
        }
        Ok(warnings) => {
            for w in warnings {
                println!("{w}");
            }
            Ok(())
        }
        Err(errors) => {
            println!("{errors}");
            Err(PlanError::Config("configuration has errors".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_parses_user_and_query() {
        let cli = Cli::try_parse_from(["plancraft", "ask", "--user", "7", "status of task 21?"])
            .unwrap();
        match cli.command {
            Commands::Ask { user, query } => {
                assert_eq!(user, 7);
                assert_eq!(query, "status of task 21?");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn provider_needs_a_credential() {
        let mut config = PlanConfig::default();
        assert!(provider(&config).is_none());
        config.services.api_key = Some("k".into());
        assert!(provider(&config).is_some());
    }
}
