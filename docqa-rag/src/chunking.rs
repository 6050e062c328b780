//! Document chunking.
//!
//! [`RecursiveSplitter`] picks the first separator that occurs in the text,
//! splits on it (keeping the separator at the start of the following piece),
//! recurses into pieces that are still too long with the remaining
//! separators, and greedily merges small pieces back into chunks of at most
//! `chunk_size` characters with up to `chunk_overlap` characters carried over
//! between neighbours. Lengths are counted in characters.
//!
//! [`Chunker`] holds one splitter per [`FileType`].

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::document::FileType;

/// Separators for plain text: paragraph, line, word, character.
pub const PLAIN_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Separators for rendered CSV rows: row, field, word.
pub const TABULAR_SEPARATORS: &[&str] = &["\n", ",", " "];

/// Recursive separator-based splitter with overlap.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: characters carried over between consecutive chunks
    /// * `separators`: split points, coarsest first; `""` splits into characters
    pub fn new(chunk_size: usize, chunk_overlap: usize, separators: &[&str]) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: separators.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(std::mem::take(&mut pending)));
            }
            if remaining.is_empty() {
                if let Some(piece) = trimmed(&piece) {
                    chunks.push(piece);
                }
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(pending));
        }
        chunks
    }

    /// Greedily concatenate pieces into chunks, keeping a tail of at most
    /// `chunk_overlap` characters as the start of the next chunk.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);
            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_window(&window) {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            total += len;
            window.push_back((piece, len));
        }

        if let Some(chunk) = join_window(&window) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn trimmed(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

fn join_window(window: &VecDeque<(String, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| piece.as_str()).collect();
    trimmed(&joined)
}

/// Split on `separator`, prefixing it to every piece after the first.
/// An empty separator splits into single characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    pieces.extend(parts.map(|part| format!("{separator}{part}")));
    pieces
}

/// Longest CSV field, in characters, before the content is treated as
/// malformed.
pub const MAX_FIELD_CHARS: usize = 131_072;

#[derive(Debug, thiserror::Error)]
enum TabularError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("field in row {row} is {len} characters, limit is {MAX_FIELD_CHARS}")]
    FieldTooLarge { row: usize, len: usize },
}

/// Render CSV as one `header: value, header: value` line per data row.
///
/// Row 0 is the header. Values past the last header are dropped. Returns
/// `Ok(None)` when the content has no rows at all. Rows are read leniently,
/// so an unterminated quote swallows the rest of the input into one field;
/// that field then trips [`MAX_FIELD_CHARS`].
fn render_tabular(content: &str) -> Result<Option<String>, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let headers = match records.next() {
        Some(header) => check_field_sizes(header?, 0)?,
        None => return Ok(None),
    };

    let mut text = String::new();
    for (row, record) in records.enumerate() {
        let record = check_field_sizes(record?, row + 1)?;
        let line = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| format!("{h}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(line.trim_end_matches([',', ' ']));
        text.push('\n');
    }
    Ok(Some(text))
}

fn check_field_sizes(
    record: csv::StringRecord,
    row: usize,
) -> Result<csv::StringRecord, TabularError> {
    match record.iter().map(|field| field.chars().count()).max() {
        Some(len) if len > MAX_FIELD_CHARS => Err(TabularError::FieldTooLarge { row, len }),
        _ => Ok(record),
    }
}

/// Splits document content by file type.
#[derive(Debug, Clone)]
pub struct Chunker {
    plain: RecursiveSplitter,
    tabular: RecursiveSplitter,
}

impl Chunker {
    pub fn new(config: &RagConfig) -> Self {
        Self {
            plain: RecursiveSplitter::new(
                config.text_chunk_size,
                config.chunk_overlap,
                PLAIN_SEPARATORS,
            ),
            tabular: RecursiveSplitter::new(
                config.csv_chunk_size,
                config.chunk_overlap,
                TABULAR_SEPARATORS,
            ),
        }
    }

    /// Split `content` into ordered chunks. Empty content yields no chunks.
    pub fn create_chunks(&self, content: &str, file_type: FileType) -> Vec<String> {
        let chunks = match file_type {
            FileType::Plain => self.plain.split_text(content),
            FileType::Tabular => self.tabular_chunks(content),
        };
        debug!(file_type = file_type.as_str(), chunk_count = chunks.len(), "created chunks");
        chunks
    }

    fn tabular_chunks(&self, content: &str) -> Vec<String> {
        match render_tabular(content) {
            Ok(Some(rows)) => self.tabular.split_text(&rows),
            Ok(None) => Vec::new(),
            Err(e) => self.tabular_fallback(content, &e),
        }
    }

    /// Malformed CSV: split the raw content with the tabular settings.
    fn tabular_fallback(&self, content: &str, error: &TabularError) -> Vec<String> {
        warn!(error = %error, "CSV parse failed, splitting raw content");
        self.tabular.split_text(content)
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(&RagConfig::default())
    }
}
