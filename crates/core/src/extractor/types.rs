//! Types for the media extraction boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single search result from the extraction service, not yet downloaded.
///
/// Immutable once produced; ranking attaches a score but never mutates the
/// candidate itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Service-side identifier used to fetch the track later.
    pub id: String,
    /// Raw display title.
    pub title: String,
    /// Uploader / channel name.
    #[serde(default)]
    pub channel: String,
    /// Duration in seconds (0 if unknown).
    #[serde(default)]
    pub duration_secs: u64,
    /// View count, when the service exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    /// Like count, when exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    /// Dislike count, when exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislike_count: Option<u64>,
    /// Whether the uploading channel is verified.
    #[serde(default)]
    pub channel_verified: bool,
}

/// Remote metadata for a single track reference, fetched without media bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub channel: String,
    /// Upload date as `YYYYMMDD`, empty when unknown.
    #[serde(default)]
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

/// Post-processing stages reported by the extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessStage {
    Convert,
    EmbedMetadata,
    EmbedThumbnail,
}

/// Events emitted while fetching and transcoding a track.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorEvent {
    /// Media transfer progress, `fraction` in `[0, 1]`.
    Downloading {
        fraction: f32,
        speed: Option<String>,
        eta: Option<String>,
    },
    /// Transfer finished, post-processing about to start.
    DownloadFinished,
    /// A post-processing stage started or finished.
    PostProcessing {
        stage: PostProcessStage,
        finished: bool,
    },
}

/// Errors surfaced by the extraction service.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The service is refusing requests (rate limit, IP block, 403).
    #[error("the media service is blocking requests; try again later or update the extraction backend")]
    Blocked,

    /// The target is missing, private or deleted.
    #[error("this track is not available; it may be private or deleted")]
    Unavailable,

    /// The target requires sign-in or age verification.
    #[error("this track cannot be fetched; it requires sign-in or age verification")]
    AuthRequired,

    /// The extraction backend binary could not be started.
    #[error("extraction backend not found at {path}")]
    BackendNotFound { path: std::path::PathBuf },

    /// The backend produced output we could not understand.
    #[error("failed to parse extractor output: {0}")]
    Parse(String),

    /// The operation was cancelled via its token.
    #[error("extraction cancelled")]
    Cancelled,

    /// I/O error talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the backend reported.
    #[error("extraction failed: {0}")]
    Failed(String),
}
