//! Types for the download orchestrator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::extractor::ExtractorError;
use crate::placer::PlacerError;

/// Errors that terminate a download task.
///
/// Everything here propagates to the caller; recoverable conditions
/// (metadata lookup failures, tag write failures, cleanup failures) are
/// absorbed inside the pipeline and never appear as task errors.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The extraction service is refusing requests.
    #[error("the media service is blocking requests; try again later or update the extraction backend")]
    Blocked,

    /// The target media is missing, private or deleted.
    #[error("this track is not available; it may be private or deleted")]
    Unavailable,

    /// The target requires sign-in or age verification.
    #[error("this track cannot be fetched; it requires sign-in or age verification")]
    AuthRequired,

    /// The expected audio file was absent after the extraction service
    /// reported success.
    #[error("converted audio file not found at {path}")]
    TranscodeMissing { path: PathBuf },

    /// The task was cancelled. Distinct from failure: cleanup still ran,
    /// but nothing went wrong.
    #[error("download cancelled")]
    Cancelled,

    /// Output path could not be prepared.
    #[error(transparent)]
    Placer(#[from] PlacerError),

    /// Any other extraction failure.
    #[error(transparent)]
    Extractor(ExtractorError),
}

impl From<ExtractorError> for DownloadError {
    fn from(e: ExtractorError) -> Self {
        match e {
            ExtractorError::Blocked => DownloadError::Blocked,
            ExtractorError::Unavailable => DownloadError::Unavailable,
            ExtractorError::AuthRequired => DownloadError::AuthRequired,
            ExtractorError::Cancelled => DownloadError::Cancelled,
            other => DownloadError::Extractor(other),
        }
    }
}

/// Severity of a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Info,
    /// Something went wrong but the task still succeeds (e.g. tags could
    /// not be written).
    Warning,
}

/// One progress event for a task. `fraction` is overall task progress in
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub status: String,
    pub fraction: f32,
    pub level: ProgressLevel,
}

impl ProgressUpdate {
    pub fn info(status: impl Into<String>, fraction: f32) -> Self {
        Self {
            status: status.into(),
            fraction,
            level: ProgressLevel::Info,
        }
    }

    pub fn warning(status: impl Into<String>, fraction: f32) -> Self {
        Self {
            status: status.into(),
            fraction,
            level: ProgressLevel::Warning,
        }
    }
}

/// State owned by one in-flight download. Created when the download starts
/// and dropped when it terminates; the cancel token is the only part shared
/// with the caller.
#[derive(Debug)]
pub struct DownloadTask {
    pub id: String,
    pub video_id: String,
    pub cancel: CancelToken,
    pub started_at: DateTime<Utc>,
    /// Set once the Resolving stage has computed the destination.
    pub output_path: Option<PathBuf>,
}

impl DownloadTask {
    pub fn new(video_id: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            video_id: video_id.into(),
            cancel,
            started_at: Utc::now(),
            output_path: None,
        }
    }

    /// Cancellation checkpoint: errors out if the caller has cancelled.
    pub fn check_cancelled(&self) -> Result<(), DownloadError> {
        if self.cancel.is_cancelled() {
            Err(DownloadError::Cancelled)
        } else {
            Ok(())
        }
    }
}
