use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ingest documents and ask questions about them.
#[derive(Debug, Parser)]
#[command(name = "docqa", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk, embed and index a .txt or .csv file.
    Ingest {
        /// File to ingest.
        path: PathBuf,
        /// Document id; a random UUID when omitted.
        #[arg(long)]
        file_id: Option<String>,
        /// Chunking rules (`txt` or `csv`) instead of the file extension.
        /// Unknown tags chunk as plain text.
        #[arg(long)]
        file_type: Option<String>,
    },
    /// Answer a question from the indexed documents.
    Ask {
        question: String,
        /// Only use chunks from this document.
        #[arg(long)]
        file_id: Option<String>,
        /// Number of chunks to retrieve.
        #[arg(long)]
        max_chunks: Option<usize>,
    },
    /// Show the chunks most similar to a query, with scores.
    Search {
        query: String,
        #[arg(long)]
        file_id: Option<String>,
        #[arg(short, long, default_value_t = 5)]
        k: usize,
    },
    /// Delete every indexed chunk in the collection.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_filters() {
        let cli = Cli::try_parse_from([
            "docqa", "ask", "What did the cat do?", "--file-id", "1", "--max-chunks", "3",
        ])
        .unwrap();
        match cli.command {
            Command::Ask { question, file_id, max_chunks } => {
                assert_eq!(question, "What did the cat do?");
                assert_eq!(file_id.as_deref(), Some("1"));
                assert_eq!(max_chunks, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_ingest_with_type_override() {
        let cli =
            Cli::try_parse_from(["docqa", "ingest", "notes.md", "--file-type", "txt"]).unwrap();
        match cli.command {
            Command::Ingest { path, file_id, file_type } => {
                assert_eq!(path, PathBuf::from("notes.md"));
                assert!(file_id.is_none());
                assert_eq!(file_type.as_deref(), Some("txt"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn search_defaults_to_five() {
        let cli = Cli::try_parse_from(["docqa", "search", "cat"]).unwrap();
        assert!(matches!(cli.command, Command::Search { k: 5, file_id: None, .. }));
    }
}
