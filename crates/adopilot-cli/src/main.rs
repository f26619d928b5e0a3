//! Adopilot CLI, entry point.
//!
//! # Commands
//!
//! - `adopilot [run]`: run the example prompts, then the custom prompt
//! - `adopilot ask -m PROMPT`: run a single prompt
//! - `adopilot tools`: show the catalog grouped by category

mod helpers;
mod prompts;
mod tools_cmd;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use adopilot_agent::{ConversationOrchestrator, ToolCatalog};
use adopilot_core::config::{load_config, Config, ConfigError};
use adopilot_mcp::{McpClient, ServerInfo};
use adopilot_providers::{HttpProvider, LlmProvider, LlmRequestConfig};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Adopilot: ask Azure DevOps questions through an LLM and the Azure DevOps MCP server
#[derive(Parser)]
#[command(name = "adopilot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Clone, Copy, Debug, Default)]
struct RunArgs {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    /// Offer every discovered tool instead of filtering by intent
    #[arg(long, global = true, default_value_t = false)]
    all_tools: bool,

    /// Stop the batch at the first failed prompt
    #[arg(long, global = true, default_value_t = false)]
    fail_fast: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the example prompts followed by the custom prompt (default)
    Run,

    /// Run a single prompt
    Ask {
        /// The prompt to send
        #[arg(short, long)]
        message: String,
    },

    /// Connect, discover tools, and show them grouped by category
    Tools,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Loaded before logging so RUST_LOG may come from .env. A missing file
    // is fine; variables may come from the shell.
    let dotenv = dotenvy::dotenv();
    init_logging(cli.run.logs);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }

    let config = load_config(None);
    let command = cli.command.unwrap_or(Commands::Run);
    validate(&command, &config).context("cannot start")?;

    let session = Session::connect(&config).await?;

    match command {
        Commands::Run => {
            let prompts = prompts::batch(&config.prompts);
            run_prompts(&session, &config, &prompts, cli.run).await
        }
        Commands::Ask { message } => run_prompts(&session, &config, &[message], cli.run).await,
        Commands::Tools => {
            tools_cmd::print_report(&session.catalog, &config.agent);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Check the settings the command needs. Only `run` and `ask` call the model.
fn validate(command: &Commands, config: &Config) -> Result<(), ConfigError> {
    match command {
        Commands::Run | Commands::Ask { .. } => config.validate(),
        Commands::Tools => config.validate_tool_server(),
    }
}

// ─────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────

/// A running tool server and its discovered catalog.
struct Session {
    client: Arc<McpClient>,
    catalog: Arc<ToolCatalog>,
    server: ServerInfo,
}

impl Session {
    /// Start the tool server, handshake, and discover its tools.
    ///
    /// Failure here is fatal: without a catalog no prompt can run.
    async fn connect(config: &Config) -> Result<Self> {
        let command = config.mcp.server_command();
        let timeout = Duration::from_secs(config.mcp.request_timeout_secs);

        let client = McpClient::spawn(&command, timeout)
            .context("failed to start the Azure DevOps MCP server")?;
        let server = client
            .initialize()
            .await
            .context("tool server handshake failed")?;
        let catalog = ToolCatalog::discover(&client).await?;

        catalog.coverage(&config.agent.categories).log();
        helpers::print_connected(&server.name, catalog.len(), &config.agent.categories);

        Ok(Self {
            client: Arc::new(client),
            catalog: Arc::new(catalog),
            server,
        })
    }

    fn orchestrator(&self, config: &Config, provider: Arc<dyn LlmProvider>, all_tools: bool) -> ConversationOrchestrator {
        ConversationOrchestrator::new(provider, self.client.clone(), self.catalog.clone(), config.agent.clone())
            .with_request_config(LlmRequestConfig::from(&config.llm))
            .with_all_tools(all_tools)
    }
}

// ─────────────────────────────────────────────
// Prompt batch
// ─────────────────────────────────────────────

/// Run prompts one after another, each in its own failure boundary.
///
/// Returns exit code 1 when any prompt failed.
async fn run_prompts(session: &Session, config: &Config, prompts: &[String], args: RunArgs) -> Result<ExitCode> {
    let provider = HttpProvider::new(&config.llm).context("failed to build the completion client")?;
    info!(
        provider = provider.display_name(),
        model = provider.model(),
        server = %session.server.name,
        "ready"
    );
    let orchestrator = session.orchestrator(config, Arc::new(provider), args.all_tools);

    let total = prompts.len();
    let mut failed = 0usize;

    for (index, prompt) in prompts.iter().enumerate() {
        helpers::print_prompt(index + 1, total, prompt);

        match orchestrator.run(prompt).await {
            Ok(outcome) => {
                helpers::print_trace(&outcome, session.catalog.len());
                helpers::print_answer(&outcome.answer);
            }
            Err(e) => {
                failed += 1;
                error!(prompt = index + 1, kind = e.kind(), error = %e, "prompt failed");
                helpers::print_failure(e.kind(), &e);
                if args.fail_fast {
                    let skipped = total - index - 1;
                    if skipped > 0 {
                        println!("Stopping: {skipped} remaining prompt(s) skipped (--fail-fast).");
                    }
                    break;
                }
            }
        }
    }

    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        println!();
        println!("{failed} of {total} prompt(s) failed.");
        Ok(ExitCode::FAILURE)
    }
}

/// Initialize tracing/logging. `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("adopilot=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
