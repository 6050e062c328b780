//! Component wiring and command execution.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use docqa_agent::{AgentLoop, ErrorCode, RetrievalOrchestrator};
use docqa_core::Llm;
use docqa_model::OpenAIClient;
use docqa_rag::{
    DocumentIndex, Embedder, FileType, IngestionPipeline, SqliteVectorStore, VectorStore,
};
use docqa_tool::{CreateNoteTool, ToolRegistry};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::cli::Command;
use crate::settings::Settings;

/// Opened store plus the settings every command is built from.
pub struct App {
    settings: Settings,
    store: Arc<dyn VectorStore>,
}

impl App {
    /// Open the vector store at the configured path.
    pub async fn open(settings: Settings) -> Result<Self> {
        let store = SqliteVectorStore::open(&settings.db_path, &settings.rag.collection)
            .await
            .with_context(|| {
                format!("failed to open vector store at {}", settings.db_path.display())
            })?;
        Ok(Self::with_store(settings, Arc::new(store)))
    }

    pub fn with_store(settings: Settings, store: Arc<dyn VectorStore>) -> Self {
        Self { settings, store }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn index(&self) -> Result<DocumentIndex> {
        let provider = self.settings.embedding_provider()?;
        Ok(DocumentIndex::new(Embedder::new(Arc::new(provider)), Arc::clone(&self.store)))
    }

    /// Pipeline over the configured embedding provider.
    pub fn pipeline(&self) -> Result<IngestionPipeline> {
        let pipeline = IngestionPipeline::builder()
            .config(self.settings.rag.clone())
            .index(self.index()?)
            .build()?;
        Ok(pipeline)
    }

    /// Orchestrator with the OpenAI chat model and the note tool.
    pub fn orchestrator(&self) -> Result<RetrievalOrchestrator> {
        let model: Arc<dyn Llm> = Arc::new(OpenAIClient::new(self.settings.openai_config()?)?);
        let tools = ToolRegistry::new()
            .with_tool(Arc::new(CreateNoteTool::new(self.settings.note_config())?));
        let agent = AgentLoop::new(model, tools, self.settings.agent_config());
        Ok(RetrievalOrchestrator::new(self.index()?, agent, self.settings.rag.max_context_chunks))
    }

    /// Run one command and return its JSON output.
    pub async fn run(&self, command: Command) -> Result<Value> {
        match command {
            Command::Ingest { path, file_id, file_type } => {
                let file_id = file_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                let file_type = file_type.as_deref().map(FileType::parse);
                self.ingest(&path, &file_id, file_type).await
            }
            Command::Ask { question, file_id, max_chunks } => {
                let response =
                    self.orchestrator()?.query(&question, file_id.as_deref(), max_chunks).await;
                Ok(serde_json::to_value(response)?)
            }
            Command::Search { query, file_id, k } => {
                let index = self.index()?;
                let results =
                    index.similarity_search_with_scores(&query, k, file_id.as_deref()).await;
                Ok(json!({ "query": query, "results": results }))
            }
            Command::Reset => {
                self.store.reset().await?;
                info!(collection = %self.settings.rag.collection, "vector store reset");
                Ok(json!({ "success": true, "collection": self.settings.rag.collection }))
            }
        }
    }

    /// Ingest one file. Upload failures are reported in the output
    /// envelope; only a pipeline that cannot be built is an `Err`.
    async fn ingest(
        &self,
        path: &Path,
        file_id: &str,
        file_type: Option<FileType>,
    ) -> Result<Value> {
        let pipeline = self.pipeline()?;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read upload");
                return Ok(upload_failure(
                    ErrorCode::FileUploadFailed,
                    format!("Error uploading file: {e}"),
                ));
            }
        };
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let result = match file_type {
            Some(file_type) => pipeline.ingest_bytes(file_id, &bytes, file_type).await,
            None => pipeline.ingest_upload(file_id, filename, &bytes).await,
        };

        match result {
            Ok(report) => Ok(serde_json::to_value(report)?),
            Err(e) => {
                error!(file_id, error = %e, "upload rejected");
                Ok(match e.validation_kind() {
                    Some(kind) => upload_failure(kind.into(), e.to_string()),
                    None => upload_failure(
                        ErrorCode::FileUploadFailed,
                        format!("Error uploading file: {e}"),
                    ),
                })
            }
        }
    }
}

fn upload_failure(code: ErrorCode, message: String) -> Value {
    json!({ "success": false, "error_code": code, "message": message })
}
