use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use causal_memory_config::AppConfig;
use causal_memory_core::{CausalMemory, CausalMemoryConfig, Embedder, Judge};
use causal_memory_llm::ollama::{OllamaEmbedder, OllamaJudge};
use causal_memory_llm::openrouter::OpenRouterJudge;

const EMBEDDING_DIMENSION: usize = 384;

#[derive(Debug, Parser)]
#[command(name = "causal-memory", version, about = "A causal event memory service")]
struct Cli {
    /// Path to an optional TOML config file layered under env var overrides.
    #[arg(long, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the REST + tool-call protocol server (or stdio, if PORT is unset).
    Serve,
    /// Record a single event.
    Add {
        text: String,
    },
    /// Ask for a causal narrative.
    Query {
        text: String,
    },
    /// Print store statistics.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    let memory = build_memory(&config)?;

    match cli.command {
        Commands::Serve => {
            causal_memory_transport::serve(&config, Arc::new(memory)).await?;
        }
        Commands::Add { text } => {
            let event_id = memory.add_event(text).await?;
            println!("event_id: {event_id}");
        }
        Commands::Query { text } => {
            let narrative = memory.query(&text).await?;
            println!("{narrative}");
        }
        Commands::Stats => {
            let stats = memory.stats().await?;
            println!(
                "total_events: {}\nlinked_events: {}\norphan_events: {}\nchain_coverage: {:.2}",
                stats.total_events, stats.linked_events, stats.orphan_events, stats.chain_coverage
            );
        }
    }

    Ok(())
}

fn build_memory(config: &AppConfig) -> Result<CausalMemory> {
    let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
        config.collaborators.embedding_model.clone(),
        EMBEDDING_DIMENSION,
    ));

    let judge: Arc<dyn Judge> = match &config.collaborators.openrouter_api_key {
        Some(api_key) => Arc::new(OpenRouterJudge::new(
            config.collaborators.llm_model.clone(),
            config.collaborators.llm_temperature,
            api_key.clone(),
            config.judge_timeout(),
        )),
        None => Arc::new(OllamaJudge::new(
            config.collaborators.llm_model.clone(),
            config.collaborators.llm_temperature,
            config.judge_timeout(),
        )),
    };

    let memory_config = CausalMemoryConfig {
        similarity_threshold: config.engine.similarity_threshold,
        soft_link_threshold: config.engine.soft_link_threshold,
        max_potential_causes: config.engine.max_potential_causes,
        time_decay_hours: config.engine.time_decay_hours,
        max_consequence_depth: config.engine.max_consequence_depth,
        embedding_cache_size: config.engine.embedding_cache_size,
        embedder_timeout: config.embedder_timeout(),
        judge_timeout: config.judge_timeout(),
    };

    Ok(CausalMemory::open(&config.storage.db_path, embedder, judge, memory_config)?)
}
