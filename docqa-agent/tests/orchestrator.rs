//! Answering with a scripted model over an in-memory index.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docqa_agent::prompt::{AGENT_SYSTEM_PROMPT, NO_CONTEXT_ANSWER};
use docqa_agent::{AgentConfig, AgentLoop, ChatError, ErrorCode, RetrievalOrchestrator};
use docqa_core::{Content, CoreError, Llm, LlmRequest, LlmResponse, Part, Tool, ToolError};
use docqa_model::MockLlm;
use docqa_rag::{
    DocumentIndex, Embedder, EmbeddingProvider, FileType, InMemoryVectorStore, IngestionPipeline,
    RagConfig,
};
use docqa_tool::{CreateNoteTool, NoteServiceConfig, ToolRegistry};
use serde_json::{Value, json};

#[derive(Default)]
struct WordEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for WordEmbedder {
    fn name(&self) -> &str {
        "words"
    }

    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.0f32; 32];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[hash % 32] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        32
    }
}

/// Records the arguments of every call and answers with a fixed note id.
#[derive(Default)]
struct RecordingNoteTool {
    calls: Mutex<Vec<Value>>,
}

#[async_trait]
impl Tool for RecordingNoteTool {
    fn name(&self) -> &str {
        "create_note"
    }

    fn description(&self) -> &str {
        "Creates a note"
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(args);
        Ok(json!({ "data": { "id": 1 } }))
    }
}

struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Never finishes in time"
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::Null)
    }
}

/// A model that never answers within any reasonable timeout.
struct SlowModel;

#[async_trait]
impl Llm for SlowModel {
    fn name(&self) -> &str {
        "slow-model"
    }

    async fn generate_content(&self, _request: LlmRequest) -> docqa_core::Result<LlmResponse> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(LlmResponse::text("unreachable"))
    }
}

fn tool_call(name: &str, args: Value) -> LlmResponse {
    LlmResponse {
        content: Some(Content::new("assistant").with_part(Part::FunctionCall {
            id: Some(format!("call_{name}")),
            name: name.to_string(),
            args,
        })),
        finish_reason: Some("tool_calls".into()),
    }
}

struct Fixture {
    orchestrator: RetrievalOrchestrator,
    model: Arc<MockLlm>,
    embedder: Arc<WordEmbedder>,
}

/// An in-memory index holding `docs`, with the embedder's call counter reset.
async fn indexed(docs: &[(&str, &str)]) -> (DocumentIndex, Arc<WordEmbedder>) {
    let embedder = Arc::new(WordEmbedder::default());
    let index =
        DocumentIndex::new(Embedder::new(embedder.clone()), Arc::new(InMemoryVectorStore::new()));
    let rag_config = RagConfig::builder().text_chunk_size(50).chunk_overlap(10).build().unwrap();
    let pipeline =
        IngestionPipeline::builder().config(rag_config).index(index.clone()).build().unwrap();
    for (file_id, text) in docs {
        assert!(pipeline.ingest(file_id, text, FileType::Plain).await.unwrap().success);
    }
    embedder.calls.store(0, Ordering::SeqCst);
    (index, embedder)
}

async fn fixture(
    model: MockLlm,
    tools: ToolRegistry,
    config: AgentConfig,
    docs: &[(&str, &str)],
) -> Fixture {
    let (index, embedder) = indexed(docs).await;
    let model = Arc::new(model);
    let agent = AgentLoop::new(model.clone(), tools, config);
    Fixture { orchestrator: RetrievalOrchestrator::new(index, agent, 5), model, embedder }
}

const CAT: &[(&str, &str)] = &[("1", "A cat sat. A dog ran.")];

#[tokio::test]
async fn blank_question_is_rejected_before_any_work() {
    let f = fixture(MockLlm::new(), ToolRegistry::new(), AgentConfig::default(), CAT).await;

    let err = f.orchestrator.answer("   ", None, None).await.unwrap_err();
    assert!(matches!(err, ChatError::Validation { .. }));
    assert_eq!(err.code(), ErrorCode::EmptyMessage);
    assert_eq!(f.model.call_count(), 0);
    assert_eq!(f.embedder.calls.load(Ordering::SeqCst), 0);

    let response = f.orchestrator.query("", None, None).await;
    assert!(!response.success);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["error_code"], "EMPTY_MESSAGE");
    assert!(json.get("answer").is_none());
}

#[tokio::test]
async fn empty_index_returns_canned_answer_without_model_call() {
    let f = fixture(MockLlm::new(), ToolRegistry::new(), AgentConfig::default(), &[]).await;

    let answer = f.orchestrator.answer("What did the cat do?", None, None).await.unwrap();
    assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
    assert!(!answer.used_context);
    assert_eq!(f.model.call_count(), 0);
}

#[tokio::test]
async fn filter_to_unknown_file_returns_canned_answer() {
    let f = fixture(MockLlm::new(), ToolRegistry::new(), AgentConfig::default(), CAT).await;
    let answer = f.orchestrator.answer("What did the cat do?", Some("2"), None).await.unwrap();
    assert!(!answer.used_context);
    assert_eq!(f.model.call_count(), 0);
}

#[tokio::test]
async fn context_is_labelled_and_sent_to_the_model() {
    let f = fixture(
        MockLlm::with_responses([LlmResponse::text("The cat sat, according to Source 1.")]),
        ToolRegistry::new().with_tool(Arc::new(RecordingNoteTool::default())),
        AgentConfig::default(),
        CAT,
    )
    .await;

    let answer = f.orchestrator.answer("What did the cat do?", Some("1"), None).await.unwrap();
    assert!(answer.used_context);
    assert_eq!(answer.answer, "The cat sat, according to Source 1.");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].metadata.file_id, "1");

    let requests = f.model.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.contents[0].role, "system");
    assert_eq!(request.contents[0].text().as_deref(), Some(AGENT_SYSTEM_PROMPT));
    let prompt = request.contents[1].text().unwrap();
    assert!(prompt.contains("Source 1:\nA cat sat. A dog ran.\n"));
    assert!(prompt.contains("Question: What did the cat do?"));
    assert_eq!(request.tools.len(), 1);
    assert_eq!(request.tools[0].name, "create_note");

    let response = f.orchestrator.query("What did the cat do?", Some("1"), None).await;
    assert!(!response.success, "script is exhausted, so the second query fails");
    assert_eq!(response.error_code, Some(ErrorCode::ChatError));
}

#[tokio::test]
async fn tool_results_are_fed_back_before_the_final_answer() {
    let note_tool = Arc::new(RecordingNoteTool::default());
    let args = json!({ "note_data": r#"{"title":"Cat","content":"The cat sat."}"# });
    let f = fixture(
        MockLlm::with_responses([
            tool_call("create_note", args.clone()),
            LlmResponse::text("Note created."),
        ]),
        ToolRegistry::new().with_tool(note_tool.clone()),
        AgentConfig::default(),
        CAT,
    )
    .await;

    let response = f.orchestrator.query("Save a note about the cat", None, None).await;
    assert!(response.success);
    assert_eq!(response.answer.as_deref(), Some("Note created."));
    assert_eq!(response.message.as_deref(), Some("Assistant responded successfully"));
    assert_eq!(note_tool.calls.lock().unwrap().as_slice(), &[args]);

    let requests = f.model.requests();
    assert_eq!(requests.len(), 2);
    let last_turn = requests[1].contents.last().unwrap();
    assert_eq!(last_turn.role, "tool");
    assert!(matches!(
        &last_turn.parts[0],
        Part::FunctionResponse { id: Some(id), name, response }
            if id == "call_create_note" && name == "create_note" && response["data"]["id"] == 1
    ));
}

#[tokio::test]
async fn malformed_note_json_is_reported_to_the_model() {
    let note_tool =
        CreateNoteTool::new(NoteServiceConfig::new("http://127.0.0.1:9", "token")).unwrap();
    let f = fixture(
        MockLlm::with_responses([
            tool_call("create_note", json!({ "note_data": "{title: broken" })),
            LlmResponse::text("I could not create the note."),
        ]),
        ToolRegistry::new().with_tool(Arc::new(note_tool)),
        AgentConfig::default(),
        CAT,
    )
    .await;

    let answer = f.orchestrator.answer("Create a note about the cat", None, None).await.unwrap();
    assert_eq!(answer.answer, "I could not create the note.");

    let requests = f.model.requests();
    let Part::FunctionResponse { response, .. } = &requests[1].contents.last().unwrap().parts[0]
    else {
        panic!("expected a function response");
    };
    assert!(response["error"].as_str().unwrap().contains("Invalid JSON format"));
}

#[tokio::test]
async fn unknown_tools_are_reported_to_the_model() {
    let f = fixture(
        MockLlm::with_responses([
            tool_call("delete_everything", json!({})),
            LlmResponse::text("Sorry."),
        ]),
        ToolRegistry::new(),
        AgentConfig::default(),
        CAT,
    )
    .await;

    let answer = f.orchestrator.answer("What did the cat do?", None, None).await.unwrap();
    assert_eq!(answer.answer, "Sorry.");
    let requests = f.model.requests();
    let Part::FunctionResponse { response, .. } = &requests[1].contents.last().unwrap().parts[0]
    else {
        panic!("expected a function response");
    };
    assert_eq!(response["error"], "Unknown tool: delete_everything");
}

#[tokio::test]
async fn tool_loop_is_bounded() {
    let note_tool = Arc::new(RecordingNoteTool::default());
    let call = || tool_call("create_note", json!({ "note_data": "{}" }));
    let f = fixture(
        MockLlm::with_responses([call(), call(), LlmResponse::text("Done.")]),
        ToolRegistry::new().with_tool(note_tool.clone()),
        AgentConfig::default().with_max_tool_iterations(2),
        CAT,
    )
    .await;

    let answer = f.orchestrator.answer("Make notes forever", None, None).await.unwrap();
    assert_eq!(answer.answer, "Done.");
    assert_eq!(note_tool.calls.lock().unwrap().len(), 2);

    let requests = f.model.requests();
    assert_eq!(requests.len(), 3);
    assert!(!requests[0].tools.is_empty());
    assert!(!requests[1].tools.is_empty());
    assert!(requests[2].tools.is_empty(), "the last round offers no tools");
}

#[tokio::test]
async fn model_ignoring_the_bound_is_a_chat_error() {
    let call = || tool_call("create_note", json!({ "note_data": "{}" }));
    let f = fixture(
        MockLlm::with_responses([call(), call()]),
        ToolRegistry::new().with_tool(Arc::new(RecordingNoteTool::default())),
        AgentConfig::default().with_max_tool_iterations(1),
        CAT,
    )
    .await;

    let err = f.orchestrator.answer("Make notes forever", None, None).await.unwrap_err();
    assert!(matches!(err, ChatError::IterationLimit(1)));
    assert_eq!(f.model.call_count(), 2);
}

#[tokio::test]
async fn model_failure_becomes_chat_error_envelope() {
    let model = MockLlm::new();
    model.push_error(CoreError::Model("API error (500): upstream".into()));
    let f = fixture(model, ToolRegistry::new(), AgentConfig::default(), CAT).await;

    let response = f.orchestrator.query("What did the cat do?", None, None).await;
    assert!(!response.success);
    assert_eq!(response.error_code, Some(ErrorCode::ChatError));
    let message = response.message.unwrap();
    assert!(message.starts_with("Error when querying documents:"));
    assert!(message.contains("upstream"));
}

#[tokio::test]
async fn slow_tools_time_out() {
    let f = fixture(
        MockLlm::with_responses([tool_call("slow", json!({})), LlmResponse::text("unreachable")]),
        ToolRegistry::new().with_tool(Arc::new(SlowTool)),
        AgentConfig::default().with_tool_timeout(Duration::from_millis(20)),
        CAT,
    )
    .await;

    let err = f.orchestrator.answer("What did the cat do?", None, None).await.unwrap_err();
    assert!(matches!(err, ChatError::Tool(ToolError::Timeout { ref name, .. }) if name == "slow"));
    assert_eq!(err.code(), ErrorCode::ChatError);
    assert_eq!(f.model.call_count(), 1);
}

#[tokio::test]
async fn slow_model_times_out_as_chat_error() {
    let (index, _) = indexed(CAT).await;
    let agent = AgentLoop::new(
        Arc::new(SlowModel),
        ToolRegistry::new(),
        AgentConfig::default().with_model_timeout(Duration::from_millis(20)),
    );
    let orchestrator = RetrievalOrchestrator::new(index, agent, 5);

    let err = orchestrator.answer("What did the cat do?", None, None).await.unwrap_err();
    assert!(matches!(
        err,
        ChatError::Model(CoreError::ModelTimeout(t)) if t == Duration::from_millis(20)
    ));

    let response = orchestrator.query("What did the cat do?", None, None).await;
    assert!(!response.success);
    assert_eq!(response.error_code, Some(ErrorCode::ChatError));
    assert!(response.answer.is_none());
    let message = response.message.unwrap();
    assert!(message.starts_with("Error when querying documents:"));
    assert!(message.contains("timed out"));
}
