//! `docrag` CLI: ingest local or Google Drive documents and query them.
//!
//! ```bash
//! # Ingest a directory of documents
//! docrag process --input-dir ./documents
//!
//! # Ingest a Google Drive folder
//! docrag process-drive --folder-id <ID> --credentials token.json
//!
//! # Ask a question, optionally restricted to one storage type
//! docrag query --question "What is the budget for Project A?" --storage-type GoogleDrive
//! ```
//!
//! Environment: `OPENAI_API_KEY` (embeddings and generation), `DATABASE_URL`
//! (PostgreSQL with pgvector). A `.env` file is honored.

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use docrag::{
    AnswerSynthesizer, DocumentSource, EmbeddingClient, GoogleDriveSource, IngestionPipeline,
    IngestionReport, LocalSource, MetadataFilter, OpenAiEmbeddingClient, OpenAiGenerator,
    PgVectorStore, RagConfig, RecursiveChunker, RetrievalEngine, VectorStore,
};

#[derive(Parser)]
#[command(
    name = "docrag",
    about = "Document ingestion and retrieval-augmented question answering",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest documents from a local directory.
    Process {
        /// Directory containing the documents to ingest.
        #[arg(long = "input-dir", alias = "input_dir")]
        input_dir: String,
        /// Storage type tag stamped into document metadata (default: Local).
        #[arg(long = "storage-type", alias = "storage_type")]
        storage_type: Option<String>,
    },
    /// Ingest documents from a Google Drive folder.
    ProcessDrive {
        /// Google Drive folder ID.
        #[arg(long = "folder-id", alias = "folder_id")]
        folder_id: String,
        /// Path to a token JSON file holding a Drive access token.
        #[arg(long)]
        credentials: String,
    },
    /// Answer a question over the ingested corpus.
    Query {
        /// The question to ask.
        #[arg(long)]
        question: String,
        /// Restrict retrieval to one storage type (Local, GoogleDrive).
        #[arg(long = "storage-type", alias = "storage_type")]
        storage_type: Option<String>,
        /// Number of chunks to retrieve.
        #[arg(long = "match-count", default_value_t = 5)]
        match_count: usize,
    },
}

async fn open_store(dimensions: usize) -> anyhow::Result<Arc<dyn VectorStore>> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL environment variable not set")?;
    let store = PgVectorStore::connect(&database_url, dimensions)
        .await
        .context("failed to open vector store")?;
    Ok(Arc::new(store))
}

async fn run_ingest(source: &dyn DocumentSource) -> anyhow::Result<IngestionReport> {
    let config = RagConfig::default();
    let embedder = Arc::new(OpenAiEmbeddingClient::from_env()?);
    let store = open_store(embedder.dimensions()).await?;
    let chunker = Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?);

    let pipeline = IngestionPipeline::builder()
        .config(config)
        .embedding_client(embedder)
        .vector_store(store)
        .chunker(chunker)
        .build()?;

    Ok(pipeline.ingest_source(source).await?)
}

fn print_report(report: &IngestionReport) -> anyhow::Result<()> {
    println!("Ingested {}/{} documents", report.succeeded.len(), report.total());
    for failure in &report.failed {
        eprintln!("  failed {} ({:?}): {}", failure.source_id, failure.kind, failure.message);
    }
    if report.succeeded.is_empty() && !report.failed.is_empty() {
        bail!("no documents were ingested");
    }
    Ok(())
}

async fn run_query(
    question: &str,
    storage_type: Option<&str>,
    match_count: usize,
) -> anyhow::Result<()> {
    let config = RagConfig::default();
    let embedder = Arc::new(OpenAiEmbeddingClient::from_env()?);
    let store = open_store(embedder.dimensions()).await?;

    let mut filter = MetadataFilter::new();
    if let Some(storage_type) = storage_type {
        filter = filter.with("storage_type", storage_type);
    }

    let engine = RetrievalEngine::new(embedder, store)?;
    let context = engine.retrieve(question, &filter, match_count).await?;

    let generator = Arc::new(OpenAiGenerator::from_env()?);
    let synthesizer = AnswerSynthesizer::new(generator, config.max_context_chars);
    let result = synthesizer.answer(question, &context).await?;

    println!("\nAnswer: {}", result.answer_text);
    println!("\nSources:");
    if result.used_sources.is_empty() {
        println!("  (none)");
    }
    for source in &result.used_sources {
        println!("  - {source}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docrag=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Process { input_dir, storage_type } => {
            println!("Processing documents from {input_dir}...");
            let mut source = LocalSource::new(input_dir);
            if let Some(label) = storage_type {
                source = source.with_storage_label(label);
            }
            let report = run_ingest(&source).await?;
            print_report(&report)?;
        }
        Commands::ProcessDrive { folder_id, credentials } => {
            println!("Processing documents from Google Drive folder {folder_id}...");
            let source = GoogleDriveSource::from_token_file(&folder_id, &credentials)?;
            let report = run_ingest(&source).await?;
            print_report(&report)?;
        }
        Commands::Query { question, storage_type, match_count } => {
            run_query(&question, storage_type.as_deref(), match_count).await?;
        }
    }
    Ok(())
}
