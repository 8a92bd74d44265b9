//! selfcall - a self-calling agent

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod server;

use commands::{init_command, run_command, serve_command, status_command};

/// selfcall - plan, act, critique and decide until done
#[derive(Parser)]
#[command(name = "selfcall")]
#[command(about = "◆ A self-calling planner, actor, critic and terminator agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (defaults to ~/.selfcall/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and workspace
    Init,
    /// Run the agent once on a goal
    Run {
        /// Goal to pursue (an example goal is used when empty)
        #[arg(short, long)]
        goal: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show system status
    Status,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Commands::Serve { verbose: true, .. }));

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("Init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Run { goal, json } => {
            if let Err(e) = run_command(config, goal, json).await {
                error!("Run failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Serve { host, port, .. } => {
            if let Err(e) = serve_command(config, host, port).await {
                error!("Serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Status => {
            if let Err(e) = status_command(config).await {
                error!("Status failed: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
