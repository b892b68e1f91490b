//! `groundrag`: ingest documents, search them, and ask grounded questions.
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use groundrag_core::config::{Config, Settings};
use groundrag_grounding::{GroundingScorer, JudgedGrounding, LexicalGrounding};
use groundrag_llm::get_default_completion;
use groundrag_pipeline::RagPipeline;

#[derive(Parser, Debug)]
#[command(name = "groundrag", version, about = "Retrieval-augmented answers with grounding scores")]
struct Cli {
    /// Configuration file (replaces ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk and index documents, then persist the snapshot
    Ingest {
        /// File or directory (default: data.source_path)
        path: Option<PathBuf>,
    },
    /// Show the chunks retrieved for a query
    Search {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Answer a question from retrieved chunks and score its grounding
    Ask {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Score how much of an answer is unsupported by the given sources
    Score {
        #[arg(long)]
        answer: String,
        #[arg(long = "source")]
        sources: Vec<String>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    let config = Config::load_from(path.map(PathBuf::as_path)).context("loading configuration")?;
    config.settings().context("invalid configuration")
}

fn warm_pipeline(settings: Settings) -> anyhow::Result<RagPipeline> {
    let pipeline = RagPipeline::from_settings(settings)?;
    pipeline.warm_start().context("warm start")?;
    Ok(pipeline)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = load_settings(cli.config.as_ref())?;
    let default_k = settings.retrieval.top_k;

    match cli.command {
        Command::Ingest { path } => {
            let pipeline = RagPipeline::from_settings(settings)?.with_progress(true);
            let report = pipeline.ingest(path.as_deref())?;
            println!(
                "Ingested {} documents into {} chunks (vector index: {}, snapshot written: {})",
                report.documents, report.chunks, report.vector_indexed, report.persisted
            );
        }
        Command::Search { query, top_k } => {
            let pipeline = warm_pipeline(settings)?;
            let retrieval = pipeline.retrieve(&query, top_k.unwrap_or(default_k));
            info!(strategy = ?retrieval.strategy, hits = retrieval.hits.len(), "search complete");
            for (rank, hit) in retrieval.hits.iter().enumerate() {
                println!("{}. [{}] {:.3}  {}", rank + 1, hit.chunk_id, hit.score, hit.text.replace('\n', " "));
            }
        }
        Command::Ask { query, top_k } => {
            let pipeline = warm_pipeline(settings)?;
            let answer = pipeline.answer(&query, top_k.unwrap_or(default_k))?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Command::Score { answer, sources } => {
            let scorer: Box<dyn GroundingScorer> = if settings.grounding.llm_judge {
                Box::new(JudgedGrounding::new(Arc::from(get_default_completion(&settings.llm)?)))
            } else {
                Box::new(LexicalGrounding)
            };
            println!("{:.4}", scorer.score(&answer, &sources));
        }
    }
    Ok(())
}
