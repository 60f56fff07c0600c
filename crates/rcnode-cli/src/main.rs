//! RC Node CLI: run photogrammetry processing workflows against a
//! Reality Capture Node.
//!
//! Reuses the same pipeline (rcnode-core) that backs the capture rig's
//! control panel: workflow files are scanned, a workflow is selected and
//! executed stage by stage while progress is streamed to the terminal.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use rcnode_cli::commands;
use rcnode_core::SimulationConfig;

/// RC Node CLI: photogrammetry workflow runner
#[derive(Parser)]
#[command(name = "rcnode", version, about = "RC Node CLI: photogrammetry workflow runner")]
pub struct Cli {
    /// Base URL of the RC Node [default: $RCNODE_URL, then http://localhost:8000]
    #[arg(long, global = true)]
    node_url: Option<String>,

    /// Bearer token for the RC Node [default: $RCNODE_AUTH_TOKEN]
    #[arg(long, global = true)]
    auth_token: Option<String>,

    /// Use a simulated node instead of HTTP
    #[arg(long, env = "RCNODE_SIMULATE", global = true)]
    simulate: bool,

    /// Artificial latency per simulated call, in milliseconds
    #[arg(long, default_value_t = 0, global = true)]
    latency_ms: u64,

    /// Command name the simulated node should fail (repeatable)
    #[arg(long = "fail-command", global = true)]
    fail_commands: Vec<String>,

    /// Progress value reported by the simulated node's `getprogress`
    #[arg(long, global = true)]
    remote_progress: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List, validate and run workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Send a single command to the node
    Send {
        /// Command name (e.g. "align")
        command: String,
        /// Positional parameters, sent as param1, param2, ...
        params: Vec<String>,
    },

    /// Query the node's progress once
    Progress,
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// List workflows in a directory
    List {
        /// Workflow directory (defaults to the per-user config dir)
        #[arg(long, env = "RCNODE_WORKFLOW_DIR")]
        dir: Option<String>,
    },
    /// Validate a workflow file without executing it
    Validate {
        /// Path to the workflow file
        file: PathBuf,
    },
    /// Run a workflow by id
    Run {
        /// Workflow id (file stem)
        id: String,
        /// Workflow directory (defaults to the per-user config dir)
        #[arg(long, env = "RCNODE_WORKFLOW_DIR")]
        dir: Option<String>,
        /// Do not poll `getprogress` after each command
        #[arg(long)]
        no_progress_query: bool,
        /// Expand ${VAR} references in command parameters
        #[arg(long)]
        expand_env: bool,
    },
}

impl Cli {
    fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            enabled: self.simulate,
            latency: Duration::from_millis(self.latency_ms),
            failing_commands: self.fail_commands.iter().cloned().collect::<HashSet<_>>(),
            remote_progress: self.remote_progress,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env / .env.local before RUST_LOG and env-backed flags are read
    let loaded = commands::load_dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rcnode=info,rcnode_core=warn,rcnode_cli=info".into()),
        )
        .init();
    for outcome in loaded {
        match outcome {
            Ok(path) => tracing::info!("[rcnode] Loaded environment from '{}'", path.display()),
            Err(e) => tracing::warn!("[rcnode] {}", e),
        }
    }

    let cli = Cli::parse();
    let ctx = commands::NodeContext::new(
        cli.node_url.as_deref(),
        cli.auth_token.as_deref(),
        &cli.simulation(),
    );

    let result = match cli.command {
        Some(Commands::Workflow { action }) => match action {
            WorkflowAction::List { dir } => match commands::workflow_dir(dir.as_deref()) {
                Ok(dir) => commands::workflow::list(&dir).await,
                Err(e) => Err(e),
            },
            WorkflowAction::Validate { file } => commands::workflow::validate(&file).await,
            WorkflowAction::Run {
                id,
                dir,
                no_progress_query,
                expand_env,
            } => match commands::workflow_dir(dir.as_deref()) {
                Ok(dir) => {
                    let options = commands::workflow::RunOptions {
                        query_progress: !no_progress_query,
                        expand_env,
                    };
                    commands::workflow::run(&ctx, &dir, &id, &options).await
                }
                Err(e) => Err(e),
            },
        },

        Some(Commands::Send { command, params }) => {
            commands::node::send(&ctx, &command, &params).await
        }

        Some(Commands::Progress) => commands::node::progress(&ctx).await,

        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
