//! Embeddings over `POST {base_url}/embeddings`.
//!
//! Chunks are sent in one request per batch. The service may answer rows out
//! of order; rows carrying an `index` are put back into input order.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Vector size of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

const PROVIDER: &str = "OpenAI";

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::Embedding { provider: PROVIDER.into(), message: message.into() }
}

/// Document and query embeddings from an OpenAI-compatible endpoint.
///
/// The `dimensions` field is only put on the wire after
/// [`with_dimensions`](Self::with_dimensions); `ada-002` rejects it.
///
/// ```rust,ignore
/// let provider = OpenAIEmbeddingProvider::new(api_key)?
///     .with_model("text-embedding-3-small")
///     .with_dimensions(512);
/// let vectors = provider.embed_batch(&["first chunk", "second chunk"]).await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    wire_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Fails on a blank key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(embedding_error("API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            wire_dimensions: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask for `dims`-sized vectors. The index sizes its store from this.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.wire_dimensions = Some(dims);
        self
    }

    /// Base URL up to and including `/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| embedding_error(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// `{"error": {"message": ...}}` if the body has that shape, else the body.
fn failure_detail(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body)
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| embedding_error("no embedding in response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");

        let body =
            EmbeddingsBody { model: &self.model, input: texts, dimensions: self.wire_dimensions };
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "embeddings endpoint unreachable");
                embedding_error(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = failure_detail(response.text().await.unwrap_or_default());
            error!(model = %self.model, %status, "embeddings request rejected");
            return Err(embedding_error(format!("{status}: {detail}")));
        }

        let reply: EmbeddingsReply = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "unreadable embeddings reply");
            embedding_error(format!("unreadable response: {e}"))
        })?;
        let vectors = in_input_order(reply.data);
        if vectors.len() != texts.len() {
            return Err(embedding_error(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn in_input_order(mut rows: Vec<EmbeddingRow>) -> Vec<Vec<f32>> {
    if rows.iter().all(|row| row.index.is_some()) {
        rows.sort_by_key(|row| row.index);
    }
    rows.into_iter().map(|row| row.embedding).collect()
}
