use clap::{Parser, Subcommand};
use lectern_context::text::{DEFAULT_MAX_CHARS, DEFAULT_OVERLAP, TextChunker, clean_text};
use lectern_embed::{EmbedConfig, FastEmbedProvider};
use lectern_retriever::{
    builder::IndexBuilder,
    extract::{PdfTextExtractor, TextExtractor},
    prompt::{DEFAULT_GROUNDING_TOP_K, build_prompt},
    retriever::{DEFAULT_TOP_K, Retriever},
    storage::{ChunkStore, SqliteStore},
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// A CLI tool to index PDF documents and retrieve grounding chunks for them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the index database file
    #[arg(short, long, default_value = "lectern.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, chunk, embed, and index a PDF document
    Index {
        /// Path to the PDF document
        pdf: PathBuf,
        /// Maximum chunk length in characters
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,
        /// Trailing characters carried over into the next chunk
        #[arg(long, default_value_t = DEFAULT_OVERLAP)]
        overlap: usize,
    },
    /// Search the index for chunks similar to a query
    Search {
        /// Free-text query
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Retrieve grounding chunks and print the assembled LLM prompt
    Ask {
        /// Free-text question
        query: String,
        /// Number of grounding chunks to retrieve
        #[arg(short, long, default_value_t = DEFAULT_GROUNDING_TOP_K)]
        top_k: usize,
    },
    /// Show index statistics
    Stats,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Full,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "full" => Ok(OutputFormat::Full),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Index {
            pdf,
            max_chars,
            overlap,
        } => {
            let raw = PdfTextExtractor.extract_text(&pdf)?;
            let document = clean_text(&raw);
            let chunks = TextChunker::new(max_chars, overlap).chunk(&document);

            let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
            let store = SqliteStore::open(&args.db).await?;

            let count = IndexBuilder::new(&store, &provider).build(&chunks).await?;
            println!(
                "Indexed {} chunks from {} into {}",
                count,
                pdf.display(),
                args.db.display()
            );
            Ok(())
        }
        Commands::Search {
            query,
            top_k,
            format,
        } => {
            let store = SqliteStore::open(&args.db).await?;
            let provider = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
            let retriever = Retriever::open(store, provider).await?;

            let results = retriever.search(&query, top_k).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&results)?);
                }
                OutputFormat::Summary => {
                    println!("Found {} similar chunks:", results.len());
                    for result in results {
                        let preview = result.text.chars().take(100).collect::<String>();
                        println!(
                            "  Score: {:.3} | {}",
                            result.score,
                            preview.replace('\n', " ")
                        );
                    }
                }
                OutputFormat::Full => {
                    for result in results {
                        println!("Score: {:.3}", result.score);
                        println!("{}", result.text);
                        println!("---");
                    }
                }
            }
            Ok(())
        }
        Commands::Ask { query, top_k } => {
            let store = SqliteStore::open(&args.db).await?;
            let provider = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
            let retriever = Retriever::open(store, provider).await?;

            let results = retriever.search(&query, top_k).await?;
            let prompt = build_prompt(&query, &results);

            // Forwarding to a language model is out of scope; the prompt is
            // the deliverable.
            println!("=== RAG prompt ===");
            println!("{prompt}");
            Ok(())
        }
        Commands::Stats => {
            let store = SqliteStore::open(&args.db).await?;
            let chunk_count = store.chunk_count().await?;

            println!("Index statistics:");
            println!("  Database: {}", args.db.display());
            println!("  Stored chunks: {chunk_count}");

            match store.get_metadata().await? {
                Some(metadata) => {
                    println!("  Model: {}", metadata.model_id());
                    println!("  Dimension: {}", metadata.dimension);
                    println!(
                        "  Normalized: {}",
                        if metadata.normalized { "Yes" } else { "No" }
                    );
                    println!("  Recorded chunks: {}", metadata.chunk_count);
                    println!("  Built at (unix): {}", metadata.created_at);
                    if metadata.chunk_count != chunk_count {
                        println!("  WARNING: recorded count disagrees with stored rows");
                    }
                }
                None => println!("  No index metadata (index not built yet)"),
            }
            Ok(())
        }
    }
}
