//! ragdesk - knowledge-base question answering server
//!
//! # Usage
//!
//! ```bash
//! # Serve the UI and API on the configured address
//! cargo run --release
//!
//! # Serve with a different knowledge base and address
//! ./ragdesk --kb docs/faq.txt --addr 127.0.0.1:9000
//!
//! # Rank entries for a question without calling an LLM
//! ./ragdesk search "сколько стоит доставка" --top-k 5
//! ```
//!
//! # Environment Variables
//!
//! - `RAGDESK_CONFIG`: Path to a TOML config file (default: `./ragdesk.toml`)
//! - `RAGDESK_SERVER_ADDR`, `RAGDESK_KB_PATH`: override the config file
//! - `RAGDESK_CORS_ORIGINS`: comma-separated origins allowed to call the API
//! - `YANDEX_API_KEY`, `YANDEX_FOLDER_ID`: YandexGPT credentials
//! - `GIGACHAT_AUTH_DATA`, `GIGACHAT_SCOPE`: GigaChat credentials
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ragdesk::api::{create_app, AppState};
use ragdesk::config::AppConfig;
use ragdesk::context::{KnowledgeIndex, KnowledgeSlots, ScoredEntry};
use ragdesk::llm::LlmRegistry;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(about = "Knowledge-base question answering with YandexGPT and GigaChat")]
#[command(version)]
struct CliArgs {
    /// Config file (otherwise RAGDESK_CONFIG, then ./ragdesk.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the built-in knowledge base document
    #[arg(long, value_name = "PATH")]
    kb: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the HTTP server (default)
    Serve,

    /// Print the entries most similar to a question
    Search {
        /// Question text
        question: String,
        /// Number of entries to show
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Search this document instead of the built-in knowledge base
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Resolve config from file, env, then CLI flags.
fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::load(),
    };
    config.apply_env_overrides();

    if let Some(addr) = &args.addr {
        config.server.addr.clone_from(addr);
    }
    if let Some(kb) = &args.kb {
        config.knowledge.default_path.clone_from(kb);
    }

    config.validate()?;
    Ok(config)
}

// ============================================================================
// Search
// ============================================================================

fn run_search(
    config: &AppConfig,
    question: &str,
    top_k: Option<usize>,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.knowledge.default_top_k);

    let results: Vec<ScoredEntry> = match file {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if top_k == 0 {
                anyhow::bail!("top_k must be > 0");
            }
            KnowledgeIndex::build(&text)?.query(question, top_k)
        }
        None => KnowledgeSlots::new(config.knowledge.default_path.clone()).ask(
            question, top_k, false,
        )?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No matching entries.");
        return Ok(());
    }
    for (rank, item) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] #{} {}",
            rank + 1,
            item.score,
            item.entry.id,
            item.entry.title
        );
        if !item.entry.tags.is_empty() {
            println!("   tags: {}", item.entry.tags.join(", "));
        }
    }
    Ok(())
}

// ============================================================================
// Server
// ============================================================================

async fn run_server(config: AppConfig) -> Result<()> {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  ragdesk - knowledge base assistant v{}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let slots = Arc::new(KnowledgeSlots::new(config.knowledge.default_path.clone()));
    let warm = slots.clone();
    let loaded = tokio::task::spawn_blocking(move || warm.warm_up()).await?;
    if !loaded {
        warn!("Starting without the default knowledge base; it will be retried on each request");
    }

    let llm = LlmRegistry::from_config(&config.llm).context("Failed to build LLM clients")?;
    info!(
        default_provider = %config.llm.default_provider,
        "LLM providers: {}",
        llm.providers()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let server_addr = config.server.addr.clone();
    let app = create_app(AppState::new(slots, llm, config));

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("✓ HTTP server listening on http://{server_addr}");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("✓ ragdesk shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    match args.command {
        Some(SubCommand::Search {
            question,
            top_k,
            file,
            json,
        }) => run_search(&config, &question, top_k, file, json),
        Some(SubCommand::Serve) | None => run_server(config).await,
    }
}
