//! `docqa` - ask questions about one document from the command line.
//!
//! ```text
//! docqa --document handbook.pdf --index handbook.index.json
//! docqa --index handbook.index.json --query "How many leave days do I get?"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use docqa_rag::openai::{OpenAIChatProvider, OpenAIEmbeddingProvider};
use docqa_rag::{Answer, DocumentSession, DocumentSource, IndexSnapshot, RagConfig, Source};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PREVIEW_CHARS: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Ask questions about a single document")]
struct Args {
    /// Document to index (text, markdown, or PDF)
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Question to answer from the indexed document
    #[arg(short, long)]
    query: Option<String>,

    /// Number of segments used as context (overrides the config file)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Index snapshot: loaded if present, written after ingestion
    #[arg(long)]
    index: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chat model used to answer
    #[arg(long, env = "DOCQA_CHAT_MODEL", default_value = "gpt-4o-mini")]
    chat_model: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "docqa=debug,docqa_rag=debug" } else { "docqa=info,docqa_rag=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, top_k: Option<usize>) -> Result<RagConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config '{}'", path.display()))?
        }
        None => RagConfig::default(),
    };
    if let Some(k) = top_k {
        config.top_k = k;
    }
    config.validate()?;
    Ok(config)
}

/// First `limit` characters of `text`, with an ellipsis when truncated.
fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

/// Numbered source previews, each followed by its origin when known.
fn source_lines(sources: &[Source]) -> Vec<String> {
    let mut lines = Vec::with_capacity(sources.len() * 2);
    for (i, source) in sources.iter().enumerate() {
        let text = preview(source.text.trim(), PREVIEW_CHARS).replace('\n', " ");
        lines.push(format!("  [{}] (distance {:.4}) {text}", i + 1, source.distance));
        if let Some(origin) = &source.origin {
            lines.push(format!("      From: {origin}"));
        }
    }
    lines
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.answer);
    if answer.sources.is_empty() {
        return;
    }
    println!("Sources:");
    for line in source_lines(&answer.sources) {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.debug);

    let config = load_config(args.config.as_deref(), args.top_k)?;
    let top_k = config.top_k;

    let embedder = OpenAIEmbeddingProvider::from_env()?;
    let generator = OpenAIChatProvider::from_env()?.with_model(&args.chat_model);
    let session = DocumentSession::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .generation_provider(Arc::new(generator))
        .build()?;

    // A fresh --document supersedes any saved index.
    let index_exists = args.index.as_deref().is_some_and(Path::exists);
    let restore_from = args.index.as_deref().filter(|_| index_exists && args.document.is_none());
    if let Some(path) = restore_from {
        let snapshot = IndexSnapshot::load(path)
            .with_context(|| format!("failed to load index '{}'", path.display()))?;
        session.restore(snapshot).await?;
    }

    let health = session.health().await;
    println!("index file:  {}", if index_exists { "present" } else { "absent" });
    println!("document:    {}", health.document_id.as_deref().unwrap_or("(none)"));
    println!("segments:    {}", health.segments);
    println!("embedding:   {}", health.embedding_provider);
    println!("generation:  {} ({})", health.generation_provider, args.chat_model);

    if let Some(path) = &args.document {
        let report = session.ingest(&DocumentSource::path(path)).await?;
        println!("indexed '{}' into {} segment(s)", report.document_id, report.segments);

        if let Some(index_path) = &args.index {
            session.snapshot().await.save(index_path)?;
        }
    }

    let Some(query) = args.query.as_deref() else {
        if args.document.is_none() {
            info!("nothing to do: pass --document and/or --query");
        }
        return Ok(());
    };

    match session.ask(query, top_k).await {
        Ok(answer) => {
            print_answer(&answer);
            Ok(())
        }
        Err(e) if e.is_retryable() => {
            warn!(error = %e, "model service unavailable");
            eprintln!("The answering service is unavailable right now. Please try again.");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
