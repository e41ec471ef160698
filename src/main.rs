//! Binary entry point: config load, server connection, chat loop, teardown.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use mcpchat::agent::Orchestrator;
use mcpchat::chat::chat_loop;
use mcpchat::config::Config;
use mcpchat::llm::AnthropicClient;
use mcpchat::mcp::{McpError, SessionRegistry};

#[derive(Debug, Parser)]
#[command(name = "mcpchat", about = "Multi-server MCP chat client")]
struct Args {
    /// Path to the servers config file.
    #[arg(long, default_value = "mcp_servers.json")]
    config: PathBuf,

    /// Override the maximum tool-call rounds per query.
    #[arg(long)]
    max_rounds: Option<u32>,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mcpchat=info,warn"));

    // Logs go to stderr; stdout is the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("loading config '{}'", args.config.display()))?;

    let api_key =
        std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY is not set")?;
    let model = AnthropicClient::new(api_key).context("building model client")?;

    let mut registry = SessionRegistry::new();
    for (name, script) in &config.servers {
        match registry.connect(name, std::path::Path::new(script)).await {
            Ok(()) => {
                let mut tool_names: Vec<String> = Vec::new();
                if let Some(session) = registry.get(name) {
                    match session.list_tools().await {
                        Ok(tools) => tool_names = tools.into_iter().map(|t| t.name).collect(),
                        Err(e) => {
                            tracing::warn!(server = %name, error = %e, "connected but listing failed");
                        }
                    }
                }
                println!("Connected to {name} with tools: {tool_names:?}");
            }
            // Bad configuration is fatal before anything runs; a server
            // that fails to come up is skipped (partial startup is fine).
            Err(
                e @ (McpError::UnsupportedScript { .. }
                | McpError::ReservedCharacter { .. }
                | McpError::DuplicateSession { .. }),
            ) => {
                let _ = registry.close_all().await;
                return Err(e).with_context(|| format!("connecting server '{name}'"));
            }
            Err(e) => {
                tracing::error!(server = %name, error = %e, "failed to connect server");
                println!("Warning: server '{name}' unavailable: {e}");
            }
        }
    }

    let orchestrator = Orchestrator::new(&registry, &model, &config.model, config.max_tokens)
        .with_max_tool_rounds(args.max_rounds.unwrap_or(config.max_tool_rounds));

    let chat_result = chat_loop(&orchestrator).await;

    if let Err(e) = registry.close_all().await {
        tracing::error!(error = %e, "teardown reported failures");
        eprintln!("Warning: {e}");
    }

    chat_result.context("chat loop I/O")?;
    Ok(())
}
