//! Environment-driven settings.
//!
//! Every knob has a default; `DOCQA_*` variables override them. A `.env`
//! file in the working directory is loaded first by [`Settings::from_env`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docqa_agent::AgentConfig;
use docqa_model::OpenAIConfig;
use docqa_model::openai::DEFAULT_OPENAI_BASE_URL;
use docqa_rag::openai::{DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL};
use docqa_rag::{OpenAIEmbeddingProvider, RagConfig};
use docqa_tool::NoteServiceConfig;
use docqa_tool::note::DEFAULT_NOTE_SERVICE_URL;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "./docqa_db/vectors.db";
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid { var: &'static str, value: String, reason: String },

    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error(transparent)]
    Rag(#[from] docqa_rag::RagError),
}

/// Resolved process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rag: RagConfig,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub max_tokens: u32,
    pub embedding_model: String,
    /// Requested output size; `None` keeps the model's native size.
    pub embedding_dimensions: Option<usize>,
    pub db_path: PathBuf,
    pub notes_url: String,
    pub notes_token: String,
    pub max_tool_iterations: usize,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    pub log_json: bool,
}

impl Settings {
    /// Load `.env` (if present) and read the process environment. A `.env`
    /// that exists but cannot be parsed is an error.
    pub fn from_env() -> Result<Self, SettingsError> {
        check_dotenv(dotenvy::dotenv().map(|_| ()))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, which maps a variable name to its
    /// value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = RagConfig::default();

        let rag = RagConfig::builder()
            .text_chunk_size(parse(&get, "DOCQA_TXT_CHUNK_SIZE", defaults.text_chunk_size)?)
            .csv_chunk_size(parse(&get, "DOCQA_CSV_CHUNK_SIZE", defaults.csv_chunk_size)?)
            .chunk_overlap(parse(&get, "DOCQA_CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .max_context_chunks(parse(
                &get,
                "DOCQA_MAX_CONTEXT_CHUNKS",
                defaults.max_context_chunks,
            )?)
            .max_file_size(parse(&get, "DOCQA_MAX_FILE_SIZE", defaults.max_file_size)?)
            .collection(get("DOCQA_COLLECTION").unwrap_or(defaults.collection))
            .build()?;

        let llm_temperature: f32 = parse(&get, "DOCQA_LLM_TEMPERATURE", 0.1)?;
        if !(0.0..=2.0).contains(&llm_temperature) {
            return Err(SettingsError::Invalid {
                var: "DOCQA_LLM_TEMPERATURE",
                value: llm_temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            });
        }
        let embedding_dimensions = match get("DOCQA_EMBEDDING_DIMENSIONS") {
            Some(_) => {
                Some(positive(&get, "DOCQA_EMBEDDING_DIMENSIONS", DEFAULT_EMBEDDING_DIMENSIONS)?)
            }
            None => None,
        };

        Ok(Self {
            rag,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("DOCQA_OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_model: get("DOCQA_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_temperature,
            max_tokens: positive(&get, "DOCQA_MAX_TOKENS", 1000)?,
            embedding_model: get("DOCQA_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimensions,
            db_path: get("DOCQA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| DEFAULT_DB_PATH.into()),
            notes_url: get("DOCQA_NOTES_URL")
                .unwrap_or_else(|| DEFAULT_NOTE_SERVICE_URL.to_string()),
            notes_token: get("DOCQA_NOTES_TOKEN").unwrap_or_default(),
            max_tool_iterations: parse(&get, "DOCQA_MAX_TOOL_ITERATIONS", 5)?,
            model_timeout: Duration::from_secs(positive(&get, "DOCQA_MODEL_TIMEOUT_SECS", 60)?),
            tool_timeout: Duration::from_secs(positive(&get, "DOCQA_TOOL_TIMEOUT_SECS", 30)?),
            log_json: matches!(get("DOCQA_LOG_JSON").as_deref(), Some("1" | "true")),
        })
    }

    pub fn api_key(&self) -> Result<&str, SettingsError> {
        self.openai_api_key.as_deref().ok_or(SettingsError::Missing("OPENAI_API_KEY"))
    }

    pub fn openai_config(&self) -> Result<OpenAIConfig, SettingsError> {
        Ok(OpenAIConfig::compatible(self.api_key()?, &self.openai_base_url, &self.llm_model)
            .with_temperature(self.llm_temperature)
            .with_max_tokens(self.max_tokens)
            .with_timeout(self.model_timeout))
    }

    pub fn embedding_provider(&self) -> Result<OpenAIEmbeddingProvider, SettingsError> {
        let mut provider = OpenAIEmbeddingProvider::new(self.api_key()?)?
            .with_model(&self.embedding_model)
            .with_base_url(&self.openai_base_url)
            .with_timeout(self.model_timeout)?;
        if let Some(dims) = self.embedding_dimensions {
            provider = provider.with_dimensions(dims);
        }
        Ok(provider)
    }

    pub fn note_config(&self) -> NoteServiceConfig {
        NoteServiceConfig::new(&self.notes_url, &self.notes_token).with_timeout(self.tool_timeout)
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::default()
            .with_max_tool_iterations(self.max_tool_iterations)
            .with_model_timeout(self.model_timeout)
            .with_tool_timeout(self.tool_timeout)
    }
}

fn parse<T, G>(get: &G, var: &'static str, default: T) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| SettingsError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<T, G>(get: &G, var: &'static str, default: T) -> Result<T, SettingsError>
where
    T: FromStr + PartialOrd + Default + std::fmt::Display,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse(get, var, default)?;
    if value <= T::default() {
        return Err(SettingsError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn check_dotenv(loaded: Result<(), dotenvy::Error>) -> Result<(), SettingsError> {
    match loaded {
        Err(e) if !e.not_found() => Err(SettingsError::Dotenv(e)),
        _ => Ok(()),
    }
}
