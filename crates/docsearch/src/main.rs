//! # docsearch CLI
//!
//! Command-line interface for docsearch, user-scoped semantic search over
//! document files.
//!
//! Documents are chunked, embedded through a remote provider and written to
//! a durable vector index plus a chunk catalog. Search embeds the query and
//! returns the caller's nearest chunks; other users' chunks are never
//! visible.
//!
//! ## Commands
//!
//! - `docsearch ingest <FILE> --user <UUID>` - Chunk, embed and index a document
//! - `docsearch search <QUERY> --user <UUID>` - Search your indexed chunks
//! - `docsearch status` - Show index and catalog statistics
//! - `docsearch repair` - Drop index entries left behind by a crash
//! - `docsearch config` - Show, initialize or locate the config file
//!
//! ## Examples
//!
//! ```bash
//! # Ingest a document
//! docsearch ingest notes.txt --user 6f9fb329-5f46-4d95-92c1-6b2cbd3b94a1
//!
//! # Search it
//! docsearch search "quarterly revenue" --user 6f9fb329-5f46-4d95-92c1-6b2cbd3b94a1
//!
//! # Get JSON output
//! docsearch search "auth" --user 6f9fb329-5f46-4d95-92c1-6b2cbd3b94a1 --format json
//! ```
//!
//! The embedding API key is read from `DOCSEARCH_API_KEY` (or
//! `OPENAI_API_KEY`); it never lives in the config file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsearch_catalog::SqliteCatalog;
use docsearch_core::{CatalogWatermark, ChunkCatalog, Embedder};
use docsearch_embed::{EmbeddingGateway, RemoteEmbedder};
use docsearch_index::DurableIndex;
use docsearch_ingest::{reconcile, repair, IngestionCoordinator};
use docsearch_query::SearchExecutor;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

mod config;
mod extract;

use config::Config;

/// Index snapshot file inside the data directory.
const INDEX_FILE: &str = "index.bin";
/// Chunk catalog database inside the data directory.
const CATALOG_FILE: &str = "catalog.db";

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "User-scoped semantic search over documents")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/docsearch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a document file
    Ingest {
        /// File to ingest
        file: PathBuf,

        /// Owning user id
        #[arg(short, long)]
        user: Uuid,

        /// Document id (random if omitted)
        #[arg(short, long)]
        document: Option<Uuid>,
    },

    /// Search your indexed chunks
    Search {
        /// Query text
        query: String,

        /// Querying user id
        #[arg(short, long)]
        user: Uuid,

        /// Maximum results (default from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show index and catalog status
    Status,

    /// Drop index entries left behind by a crash
    Repair,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for ingest results.
#[derive(Serialize)]
struct IngestOutput {
    file: String,
    document_id: String,
    chunks_indexed: usize,
}

/// Output structure for search results.
#[derive(Serialize)]
struct SearchOutput {
    query: String,
    results: Vec<ResultItem>,
}

#[derive(Serialize)]
struct ResultItem {
    document_id: String,
    chunk_index: u32,
    distance: f32,
    content: String,
}

/// Output structure for status.
#[derive(Serialize)]
struct StatusOutput {
    data_dir: String,
    model: String,
    dimension: usize,
    indexed_vectors: u64,
    committed_chunks: u64,
    orphaned_vectors: u64,
}

/// Output structure for repair.
#[derive(Serialize)]
struct RepairOutput {
    removed: u64,
    remaining: u64,
}

/// Open the durable stores under the configured data directory.
async fn open_stores(config: &Config) -> Result<(Arc<DurableIndex>, Arc<SqliteCatalog>)> {
    config.validate()?;

    let data_dir = config.resolved_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let index = DurableIndex::open(data_dir.join(INDEX_FILE), config.embedding.dimension)
        .await
        .context("Failed to open vector index")?;
    let catalog =
        SqliteCatalog::open(data_dir.join(CATALOG_FILE)).context("Failed to open chunk catalog")?;

    Ok((Arc::new(index), Arc::new(catalog)))
}

/// Build the embedding gateway from config plus the environment API key.
fn create_gateway(config: &Config) -> Result<Arc<EmbeddingGateway>> {
    let api_key = config::api_key()
        .context("No embedding API key set; export DOCSEARCH_API_KEY or OPENAI_API_KEY")?;

    let embedder = RemoteEmbedder::new(
        api_key,
        &config.embedding.base_url,
        config.model_config(),
        Duration::from_secs(config.embedding.timeout_secs),
        config.embedding.max_retries,
    )
    .context("Failed to create embedding client")?;

    Ok(Arc::new(EmbeddingGateway::new(
        Arc::new(embedder) as Arc<dyn Embedder>,
        config.embedding.batch_size,
    )))
}

/// Create the full pipeline: stores reconciled against each other, the
/// watermark seeded, and both coordinators sharing the same components.
async fn create_components(config: &Config) -> Result<(IngestionCoordinator, SearchExecutor)> {
    let (index, catalog) = open_stores(config).await?;
    let gateway = create_gateway(config)?;

    let report = reconcile(&index, catalog.as_ref())
        .await
        .context("Index and catalog disagree; the snapshot file may be damaged")?;
    if report.orphaned > 0 {
        warn!(
            "index holds {} uncommitted vectors; run 'docsearch repair' to drop them",
            report.orphaned
        );
    }
    let watermark = Arc::new(CatalogWatermark::new(report.committed));

    let coordinator = IngestionCoordinator::new(
        Arc::clone(&gateway),
        Arc::clone(&index),
        Arc::clone(&catalog) as Arc<dyn ChunkCatalog>,
        Arc::clone(&watermark),
        config.chunk_config(),
    );
    let executor = SearchExecutor::new(
        gateway,
        index,
        catalog as Arc<dyn ChunkCatalog>,
        watermark,
        config.query.fan_out,
    );

    Ok((coordinator, executor))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    // Setup logging
    let level = match cli.verbose {
        0 => config.logging.level.parse().unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Ingest {
            file,
            user,
            document,
        } => {
            if !file.exists() {
                anyhow::bail!("File does not exist: {}", file.display());
            }

            info!("Ingesting {}", file.display());

            let (coordinator, _executor) = create_components(&config).await?;

            let text = extract::extract_text(&file);
            let document_id = document.unwrap_or_else(Uuid::new_v4);

            let report = coordinator
                .ingest(document_id, user, &text)
                .await
                .with_context(|| format!("Failed to ingest {}", file.display()))?;

            match cli.format {
                OutputFormat::Json => {
                    let output = IngestOutput {
                        file: file.to_string_lossy().to_string(),
                        document_id: report.document_id.to_string(),
                        chunks_indexed: report.chunks_indexed,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    if report.chunks_indexed == 0 {
                        println!(
                            "No text extracted from {}; nothing indexed.",
                            file.display()
                        );
                    } else {
                        println!(
                            "Ingested {} as document {} ({} chunks)",
                            file.display(),
                            report.document_id,
                            report.chunks_indexed
                        );
                    }
                }
            }
        }

        Commands::Search { query, user, limit } => {
            let (_coordinator, executor) = create_components(&config).await?;

            let limit = limit.unwrap_or(config.query.default_limit);
            let hits = executor
                .search(&query, user, limit)
                .await
                .context("Search failed")?;

            match cli.format {
                OutputFormat::Json => {
                    let output = SearchOutput {
                        query: query.clone(),
                        results: hits
                            .iter()
                            .map(|hit| ResultItem {
                                document_id: hit.chunk.document_id.to_string(),
                                chunk_index: hit.chunk.sequence_index,
                                distance: hit.distance,
                                content: truncate(&hit.chunk.content, 200),
                            })
                            .collect(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!("Query: {query}\n");
                    if hits.is_empty() {
                        println!("No results found.");
                    } else {
                        for (i, hit) in hits.iter().enumerate() {
                            println!(
                                "{}. document {} chunk {} (distance: {:.3})",
                                i + 1,
                                hit.chunk.document_id,
                                hit.chunk.sequence_index,
                                hit.distance
                            );
                            println!("   {}", truncate(&hit.chunk.content, 100));
                            println!();
                        }
                    }
                }
            }
        }

        Commands::Status => {
            let (index, catalog) = open_stores(&config).await?;

            let report = reconcile(&index, catalog.as_ref())
                .await
                .context("Index and catalog disagree; the snapshot file may be damaged")?;
            let chunks = catalog.count().await.context("Failed to count chunks")?;
            let data_dir = config.resolved_data_dir()?;

            match cli.format {
                OutputFormat::Json => {
                    let output = StatusOutput {
                        data_dir: data_dir.to_string_lossy().to_string(),
                        model: config.embedding.model.clone(),
                        dimension: config.embedding.dimension,
                        indexed_vectors: report.index_len,
                        committed_chunks: chunks,
                        orphaned_vectors: report.orphaned,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!("Index status");
                    println!("  Data dir:  {}", data_dir.display());
                    println!(
                        "  Model:     {} ({} dims)",
                        config.embedding.model, config.embedding.dimension
                    );
                    println!("  Vectors:   {}", report.index_len);
                    println!("  Chunks:    {}", chunks);
                    if report.orphaned > 0 {
                        println!(
                            "  Orphaned:  {} (run 'docsearch repair' to drop them)",
                            report.orphaned
                        );
                    }
                }
            }
        }

        Commands::Repair => {
            let (index, catalog) = open_stores(&config).await?;

            let removed = repair(&index, catalog.as_ref())
                .await
                .context("Repair failed")?;
            let remaining = index.len().await as u64;

            match cli.format {
                OutputFormat::Json => {
                    let output = RepairOutput { removed, remaining };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    if removed == 0 {
                        println!("Index and catalog are in sync; nothing to repair.");
                    } else {
                        println!("Dropped {removed} uncommitted vectors ({remaining} remain).");
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

/// Truncate a string to max length, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
