//! # docqa-rag
//!
//! The ingestion-to-retrieval half of docqa.
//!
//! - [`Chunker`] splits plain text and CSV into overlapping chunks with a
//!   recursive separator strategy
//! - [`Embedder`] wraps an [`EmbeddingProvider`] and drops blank inputs
//!   before any network call
//! - [`VectorStore`] persists records; [`SqliteVectorStore`] is the durable
//!   backend and [`InMemoryVectorStore`] serves tests
//! - [`DocumentIndex`] stores chunk batches under deterministic ids and runs
//!   filtered similarity search that degrades to an empty result
//! - [`IngestionPipeline`] composes the above for one uploaded document
//!
//! ```rust,ignore
//! let index = DocumentIndex::new(embedder.clone(), Arc::new(store));
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(embedder)
//!     .index(index.clone())
//!     .build()?;
//!
//! let report = pipeline.ingest("42", &text, FileType::Plain).await?;
//! let hits = index.similarity_search_with_scores("What did the cat do?", 5, Some("42")).await;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
pub mod openai;
pub mod pipeline;
pub mod sqlite;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveSplitter};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    ChunkMetadata, FileType, IndexedRecord, IngestionReport, PreparedChunk, RetrievalResult,
    RetrievedChunk, StoreOutcome,
};
pub use embedding::{Embedder, EmbeddingProvider, prepare_document_embeddings};
pub use error::{RagError, Result, ValidationKind};
pub use index::DocumentIndex;
pub use inmemory::InMemoryVectorStore;
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{IngestionPipeline, IngestionPipelineBuilder};
pub use sqlite::SqliteVectorStore;
pub use vectorstore::VectorStore;
