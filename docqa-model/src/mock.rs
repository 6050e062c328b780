//! Scripted model for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use docqa_core::{CoreError, Llm, LlmRequest, LlmResponse, Result};

/// A [`Llm`] that replays queued responses and records every request.
///
/// Once the script runs out every further call fails with
/// [`CoreError::Model`].
#[derive(Default)]
pub struct MockLlm {
    script: Mutex<VecDeque<Result<LlmResponse>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses to return in order.
    pub fn with_responses(responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.push(response);
        }
        mock
    }

    pub fn push(&self, response: LlmResponse) {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(Ok(response));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: CoreError) {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_content(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request);
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(CoreError::Model("mock script exhausted".to_string())))
    }
}
