//! Trait definition for the metadata lookup boundary.

use async_trait::async_trait;

use super::types::{LookupError, Recording};

/// A recording search backend (MusicBrainz in production, a mock in tests).
#[async_trait]
pub trait RecordingLookup: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Run a recording search with the backend's query syntax, returning at
    /// most `limit` records in relevance order.
    async fn search_recordings(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Recording>, LookupError>;
}
