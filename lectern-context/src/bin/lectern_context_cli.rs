use clap::Parser;
use lectern_context::text::{DEFAULT_MAX_CHARS, DEFAULT_OVERLAP, TextChunker, clean_text};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};

/// A CLI tool to clean and chunk document text into JSON output using lectern-context.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Maximum length for each text chunk, in characters.
    #[arg(short, long, default_value_t = DEFAULT_MAX_CHARS)]
    max_chars: usize,

    /// Trailing characters duplicated into the next chunk.
    #[arg(short, long, default_value_t = DEFAULT_OVERLAP)]
    overlap: usize,

    /// Skip the cleaning pass and chunk the input verbatim.
    #[arg(long)]
    raw: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let input_text = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let document = if args.raw {
        input_text
    } else {
        clean_text(&input_text)
    };

    let chunker = TextChunker::new(args.max_chars, args.overlap);
    let chunks = chunker.chunk(&document);

    #[derive(Serialize)]
    struct SerializableChunk<'a> {
        sequence: usize,
        text: &'a str,
    }

    let serializable_chunks: Vec<SerializableChunk> = chunks
        .iter()
        .enumerate()
        .map(|(sequence, text)| SerializableChunk { sequence, text })
        .collect();

    let json_output = serde_json::to_string_pretty(&serializable_chunks)?;
    println!("{}", json_output);

    Ok(())
}
