//! Trait definition for the media extraction boundary.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::cancel::CancelToken;

use super::types::{ExtractorError, ExtractorEvent, SearchCandidate, TrackInfo};

/// A media extraction backend: catalog search, per-track metadata, and
/// fetch-plus-transcode to a target path.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Search the catalog, returning at most `limit` candidates in the
    /// service's own order.
    async fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchCandidate>, ExtractorError>;

    /// Fetch remote metadata for one track, without downloading media.
    async fn fetch_info(&self, video_id: &str) -> Result<TrackInfo, ExtractorError>;

    /// Fetch the track and transcode it, writing the final audio file at
    /// `output_path`. Progress events go to `events_tx`; if the receiver is
    /// dropped, extraction continues without progress reporting. The cancel
    /// token is polled throughout and aborts the transfer when set.
    async fn fetch_audio(
        &self,
        video_id: &str,
        output_path: &Path,
        events_tx: mpsc::Sender<ExtractorEvent>,
        cancel: &CancelToken,
    ) -> Result<(), ExtractorError>;
}
