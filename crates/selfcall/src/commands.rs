//! selfcall command implementations

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use selfcall_agent::{
    AgentLoop, LlmPersonas, Persona, PersonaInvoker, PromptBuilder, RunResult, MAX_CYCLES,
};
use selfcall_config::{self, Config};
use selfcall_provider::openrouter::OpenRouterProvider;

use crate::server;

/// Goals used when `run` is given nothing to do
pub const EXAMPLE_GOALS: [&str; 4] = [
    "Design a morning routine that balances focus and rest.",
    "Plan a product launch checklist for a new AI feature.",
    "Devise a weekly learning schedule for mastering TypeScript.",
    "Draft a social media strategy for showcasing an open-source project.",
];

/// Pick an example goal when `goal` is absent or blank
pub fn resolve_goal(goal: Option<String>, seed: u32) -> String {
    match goal {
        Some(goal) if !goal.trim().is_empty() => goal,
        _ => EXAMPLE_GOALS[seed as usize % EXAMPLE_GOALS.len()].to_string(),
    }
}

async fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_required(path).await,
        None => Config::load().await,
    };
    config.context("Failed to load config")
}

/// Wire the configured provider into a shareable agent
fn build_agent(config: &Config) -> Result<AgentLoop<dyn PersonaInvoker>> {
    let api_key = config
        .api_key()
        .context("No API key configured. Set one in ~/.selfcall/config.json")?;

    let provider = OpenRouterProvider::new(
        api_key,
        config.api_base(),
        Some(config.default_model()),
    )
    .with_timeout(config.request_timeout());

    let personas = LlmPersonas::new(provider, PromptBuilder::new(config.personas_path()))
        .with_sampling(config.agent.max_tokens, config.agent.temperature)
        .with_timeout(config.request_timeout());
    debug!("personas use model {}", personas.model());

    let invoker: Arc<dyn PersonaInvoker> = Arc::new(personas);
    Ok(AgentLoop::from_shared(invoker))
}

/// Human-readable rendering of a finished run
pub fn render_result(result: &RunResult) -> String {
    let mut out = String::new();
    for turn in &result.transcript {
        out.push_str(&format!("[{}] {}: {}\n", turn.step, turn.role, turn.content));
    }
    out.push_str(&format!("\n◆ Outcome: {}\n", result.outcome));
    out.push_str(if result.completed {
        "Completed: Yes"
    } else if result.is_crash() {
        "Completed: No (agent crashed)"
    } else {
        "Completed: No (max depth reached)"
    });
    out
}

/// Initialize config, workspace and persona prompt templates
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing selfcall...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = selfcall_config::init().await?;

    let personas = config.personas_path();
    for persona in Persona::CYCLE {
        create_template(
            &personas,
            &PromptBuilder::file_name(persona),
            PromptBuilder::default_prompt(persona),
        )
        .await?;
    }

    println!("\n◆ selfcall initialized");
    println!("\nNext steps:");
    println!("  1. Add your API key to {}", selfcall_config::config_path().display());
    println!("     Get one at: https://openrouter.ai/keys");
    println!("  2. Edit the persona prompts in {}", personas.display());
    println!("  3. Run the agent: selfcall run -g \"Plan a 3-day offsite\"");

    Ok(())
}

async fn create_template(dir: &Path, filename: &str, content: &str) -> Result<()> {
    let path = dir.join(filename);
    if !path.exists() {
        tokio::fs::write(&path, format!("{}\n", content))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  Created {}", filename);
    }
    Ok(())
}

/// Run the agent once and print the transcript
pub async fn run_command(config_path: Option<&Path>, goal: Option<String>, json: bool) -> Result<()> {
    let config = load_config(config_path).await?;
    let agent = build_agent(&config)?;

    let goal = resolve_goal(goal, chrono::Utc::now().timestamp_subsec_nanos());
    if !json {
        println!("◆ Goal: {}", goal);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let result = agent.run(&goal).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_result(&result));
    }

    Ok(())
}

/// Serve the agent over HTTP
pub async fn serve_command(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = load_config(config_path).await?;
    let agent = build_agent(&config)?;

    let host = host.unwrap_or_else(|| config.serve.host.clone());
    let port = port.unwrap_or(config.serve.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("◆ listening on http://{}", addr);
    println!("◆ POST http://{}/api/agent", addr);

    axum::serve(listener, server::router(agent))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("◆ server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Show system status
pub async fn status_command(config_path: Option<&Path>) -> Result<()> {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(selfcall_config::config_path);

    println!("◆ selfcall System Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:    {} {}",
        config_file.display(),
        if config_file.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = if config_file.exists() {
        load_config(Some(&config_file)).await?
    } else {
        Config::default()
    };

    let workspace = config.workspace_path();
    println!(
        "Workspace: {} {}",
        workspace.display(),
        if workspace.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );
    println!("Model:     {}", config.default_model());
    println!(
        "API Key:   {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    println!("Timeout:   {}s per persona", config.request_timeout().as_secs());
    println!("Cycles:    {} max", MAX_CYCLES);

    println!("\n◆ Ready");

    Ok(())
}
