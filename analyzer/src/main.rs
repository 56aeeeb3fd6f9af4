use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tempest_core::{corpus, stopwords, TermMatrix};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tempest-analyzer")]
#[command(about = "Build and query the weighted article index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Corpus snapshot path
    #[arg(long)]
    corpus: PathBuf,
    /// Stopword file path (one lowercase word per line)
    #[arg(long)]
    stopwords: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack crawled JSONL records into a corpus snapshot
    Snapshot {
        /// Crawler output (JSONL)
        #[arg(long)]
        input: PathBuf,
        /// Snapshot file to write
        #[arg(long)]
        output: PathBuf,
    },
    /// Urls of documents containing every query term
    Query {
        #[command(flatten)]
        index: IndexArgs,
        /// Free-text query
        text: String,
    },
    /// Urls of the top-scoring documents for a query
    Score {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long, default_value_t = 5)]
        top: usize,
        /// Free-text query
        text: String,
    },
    /// Titles of the documents most similar to one document
    Similar {
        #[command(flatten)]
        index: IndexArgs,
        /// Document index in corpus order
        #[arg(long)]
        doc: usize,
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Highest-weight terms, corpus-wide or for one document
    TopTerms {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Restrict to a single document
        #[arg(long)]
        doc: Option<usize>,
    },
    /// Export one document's term weights for word-cloud rendering
    Cloud {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long)]
        doc: usize,
        /// JSON file to write (term -> weight)
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot { input, output } => {
            let docs = corpus::read_jsonl(&input)?;
            corpus::save_snapshot(&output, &docs)?;
            tracing::info!(num_docs = docs.len(), output = %output.display(), "snapshot written");
        }
        Commands::Query { index, text } => {
            for url in load_index(&index)?.query(&text) {
                println!("{url}");
            }
        }
        Commands::Score { index, top, text } => {
            for url in load_index(&index)?.query_scored(&text, top) {
                println!("{url}");
            }
        }
        Commands::Similar { index, doc, top } => {
            for title in load_index(&index)?.most_similar(doc, top)? {
                println!("{title}");
            }
        }
        Commands::TopTerms { index, top, doc } => {
            let matrix = load_index(&index)?;
            let ranked = match doc {
                Some(i) => matrix.top_terms_for_doc(top, i)?,
                None => matrix.top_terms(top),
            };
            for (term, weight) in ranked {
                println!("{term}\t{weight:.6}");
            }
        }
        Commands::Cloud { index, doc, output } => {
            let weights = load_index(&index)?.doc_weights(doc)?;
            fs::write(&output, serde_json::to_string_pretty(&weights)?)?;
            tracing::info!(doc, terms = weights.len(), output = %output.display(), "weights exported");
        }
    }
    Ok(())
}

fn load_index(args: &IndexArgs) -> Result<TermMatrix> {
    let (docs, meta) = corpus::load_snapshot(&args.corpus)?;
    let stops = stopwords::load(&args.stopwords)?;
    tracing::info!(
        num_docs = docs.len(),
        stopwords = stops.len(),
        snapshot_created_at = %meta.created_at,
        "corpus loaded"
    );
    Ok(TermMatrix::build(&docs, stops))
}
