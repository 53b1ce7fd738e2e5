//! Scripted generation client.

use async_trait::async_trait;
use manzai_core::{GenerateRequest, GenerateResponse};
use manzai_error::{GenerationError, GenerationErrorKind, GenerationResult};
use manzai_interface::GenerationClient;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single scripted outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this text
    Success(String),
    /// Fail with this error
    Error(GenerationErrorKind),
}

/// Generation client that replays scripted responses in order.
///
/// Once the script runs out every call fails with a transport error, so a
/// test that makes more calls than expected fails loudly.
pub struct MockGenerationClient {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<GenerateRequest>>,
    call_count: AtomicUsize,
}

impl MockGenerationClient {
    /// Replay `responses` in order.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Succeed once with `text`.
    pub fn new_success(text: impl Into<String>) -> Self {
        Self::new(vec![MockResponse::Success(text.into())])
    }

    /// Fail once with `error`.
    pub fn new_error(error: GenerationErrorKind) -> Self {
        Self::new(vec![MockResponse::Error(error)])
    }

    /// Number of generate calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().expect("Mock lock poisoned").clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, req: &GenerateRequest) -> GenerationResult<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("Mock lock poisoned")
            .push(req.clone());

        let next = self
            .responses
            .lock()
            .expect("Mock lock poisoned")
            .pop_front();
        match next {
            Some(MockResponse::Success(text)) => Ok(GenerateResponse::text(text)),
            Some(MockResponse::Error(kind)) => Err(GenerationError::new(kind)),
            None => Err(GenerationError::new(GenerationErrorKind::Http(
                "no scripted response left".to_string(),
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
