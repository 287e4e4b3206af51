//! Engine KB - Industrial Equipment Knowledge Pipeline
//!
//! # Usage
//!
//! ```bash
//! # Segment the spec document, embed sections, persist the store
//! engine-kb load-spec --spec data_sources/engine_spec_data.doc --index data/spec_store
//!
//! # Query the persisted store
//! engine-kb query --index data/spec_store "turbine vibration under load"
//!
//! # Window a sensor CSV and report what would be upserted
//! engine-kb ingest --csv data_sources/synthetic_engine_data.csv
//!
//! # Serve the status endpoint
//! engine-kb serve --addr 0.0.0.0:8000
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (default: info)
//! - `ENGINE_KB_CONFIG`: Path to a TOML config file (same as `--config`)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use engine_kb::config::KbConfig;
use engine_kb::ingest::{ingest_windows, read_sensor_csv, GraphSink, InMemoryGraphSink};
use engine_kb::retrieval::{HashEmbedder, Retriever};
use engine_kb::spec_doc::{load_spec_text, split_sections};
use engine_kb::vector_store::EmbeddingsStore;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "engine-kb")]
#[command(about = "Industrial equipment knowledge pipeline")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (falls back to ./engine_kb.toml, then defaults)
    #[arg(long, env = "ENGINE_KB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Serve the HTTP status endpoint
    Serve {
        /// Listen address (overrides config)
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Segment the spec document, embed each section, persist the store
    LoadSpec {
        /// Spec document path (overrides config)
        #[arg(long)]
        spec: Option<PathBuf>,
        /// Base path for the index pair (overrides config)
        #[arg(long)]
        index: Option<PathBuf>,
        /// Embedding dimension (overrides config)
        #[arg(long)]
        dim: Option<usize>,
    },

    /// Query a persisted store with free text
    Query {
        /// Base path of the persisted index pair (overrides config)
        #[arg(long)]
        index: Option<PathBuf>,
        /// Number of results to return
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        /// Query text
        query: String,
    },

    /// Window a sensor CSV and upsert feature windows
    Ingest {
        /// Sensor CSV path (overrides config)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Window length in readings (overrides config)
        #[arg(long)]
        window_size: Option<usize>,
        /// Window stride in readings (overrides config)
        #[arg(long)]
        stride: Option<usize>,
    },
}

// ============================================================================
// Subcommand handlers
// ============================================================================

async fn run_serve(config: &KbConfig, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.api_addr.clone());
    let app = engine_kb::api::create_app();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Status API listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn run_load_spec(
    config: &KbConfig,
    spec: Option<PathBuf>,
    index: Option<PathBuf>,
    dim: Option<usize>,
) -> Result<()> {
    let spec_path = spec.unwrap_or_else(|| config.spec_path.clone());
    let index_path = index.unwrap_or_else(|| config.index_path.clone());
    let dim = dim.unwrap_or(config.embedding_dim);

    let text = load_spec_text(&spec_path)
        .with_context(|| format!("failed to load spec {}", spec_path.display()))?;
    let sections = split_sections(&text);
    info!(sections = sections.len(), "Segmented specification document");

    let mut retriever = Retriever::with_empty_store(Box::new(HashEmbedder::new(dim)))
        .context("failed to construct embeddings store")?;
    let count = retriever.index_sections(&sections, &spec_path.display().to_string())?;

    retriever
        .store()
        .save(&index_path)
        .with_context(|| format!("failed to save store at {}", index_path.display()))?;

    println!("Stored {count} spec sections into {}", index_path.display());
    Ok(())
}

fn run_query(config: &KbConfig, index: Option<PathBuf>, query: &str, k: usize) -> Result<()> {
    let index_path = index.unwrap_or_else(|| config.index_path.clone());

    let store = EmbeddingsStore::load(&index_path)
        .with_context(|| format!("failed to load store at {}", index_path.display()))?;
    let embedder = HashEmbedder::new(store.dim());
    let retriever = Retriever::new(Box::new(embedder), store)?;

    let results = retriever.search(query, k)?;
    if results.is_empty() {
        println!("No results (store is empty)");
        return Ok(());
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. score={:+.4}  {}",
            rank + 1,
            result.score,
            serde_json::to_string(&result.metadata)?
        );
    }
    Ok(())
}

fn run_ingest(
    config: &KbConfig,
    csv: Option<PathBuf>,
    window_size: Option<usize>,
    stride: Option<usize>,
) -> Result<()> {
    let csv_path = csv.unwrap_or_else(|| config.sensor_csv.clone());
    let window_size = window_size.unwrap_or(config.window_size);
    let stride = stride.unwrap_or(config.stride);

    let table = read_sensor_csv(&csv_path)
        .with_context(|| format!("failed to read sensor CSV {}", csv_path.display()))?;
    info!(units = table.unit_ids().len(), rows = table.row_count(), "Loaded sensor table");

    // In-memory sink until a graph driver is wired in; the upsert contract
    // (merge by window_id) is identical.
    let sink = InMemoryGraphSink::new();
    let inserted = ingest_windows(&table, &sink, window_size, stride, config.batch_size)?;

    println!(
        "Computed {} feature windows across {} units ({} inserted into {} sink)",
        sink.window_count(),
        table.unit_ids().len(),
        inserted,
        sink.backend_name()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = KbConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        SubCommand::Serve { addr } => run_serve(&config, addr).await,
        SubCommand::LoadSpec { spec, index, dim } => run_load_spec(&config, spec, index, dim),
        SubCommand::Query { index, k, query } => run_query(&config, index, &query, k),
        SubCommand::Ingest {
            csv,
            window_size,
            stride,
        } => run_ingest(&config, csv, window_size, stride),
    }
}
