//! Mock recording lookup for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::metadata::{LookupError, Recording, RecordingLookup};

/// Mock implementation of the `RecordingLookup` trait.
///
/// By default every search returns the configured recording list. Scripted
/// responses (per-call results or errors) can be queued with
/// [`push_response`](Self::push_response), and `fail_all` makes every call
/// fail, for exercising the resolver's degradation paths.
#[derive(Clone, Default)]
pub struct MockLookup {
    recordings: Arc<RwLock<Vec<Recording>>>,
    responses: Arc<RwLock<VecDeque<Result<Vec<Recording>, LookupError>>>>,
    fail_all: Arc<RwLock<bool>>,
    queries: Arc<RwLock<Vec<String>>>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recordings returned when no scripted response is queued.
    pub async fn set_recordings(&self, recordings: Vec<Recording>) {
        *self.recordings.write().await = recordings;
    }

    /// Queue one response; consumed in FIFO order before the default list.
    pub async fn push_response(&self, response: Result<Vec<Recording>, LookupError>) {
        self.responses.write().await.push_back(response);
    }

    /// Make every search fail.
    pub async fn fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// Queries passed to `search_recordings` so far.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl RecordingLookup for MockLookup {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_recordings(
        &self,
        query: &str,
        _limit: u32,
    ) -> Result<Vec<Recording>, LookupError> {
        self.queries.write().await.push(query.to_string());

        if *self.fail_all.read().await {
            return Err(LookupError::ApiError {
                status: 500,
                message: "mock lookup failure".to_string(),
            });
        }
        if let Some(response) = self.responses.write().await.pop_front() {
            return response;
        }
        Ok(self.recordings.read().await.clone())
    }
}
