//! Mock media extractor for testing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::cancel::CancelToken;
use crate::extractor::{
    ExtractorError, ExtractorEvent, MediaExtractor, PostProcessStage, SearchCandidate, TrackInfo,
};

/// How the mock behaves when asked to fetch audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBehavior {
    /// Write a fake audio file at the output path (optionally with a
    /// thumbnail artifact next to it) and report progress. The default.
    WriteFile { with_artifacts: bool },
    /// Write a partial file plus a `.part` sibling, then fail with the
    /// configured fetch error.
    WritePartialThenFail,
    /// Fail with the configured fetch error without touching the disk.
    Fail,
    /// Report success without writing anything.
    WriteNothing,
    /// Write a partial file, then park until the cancel token fires.
    WaitForCancel,
}

/// Mock implementation of the `MediaExtractor` trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results and track info
/// - Script the fetch-audio stage (success, failure, cancellation)
/// - Track calls for assertions
#[derive(Clone)]
pub struct MockExtractor {
    results: Arc<RwLock<Vec<SearchCandidate>>>,
    info: Arc<RwLock<Option<TrackInfo>>>,
    fetch_behavior: Arc<RwLock<FetchBehavior>>,
    /// Error used by the failing fetch behaviors; taken on use.
    fetch_error: Arc<RwLock<Option<ExtractorError>>>,
    /// If set, the next search or info call fails with this error.
    next_error: Arc<RwLock<Option<ExtractorError>>>,
    searches: Arc<RwLock<Vec<String>>>,
    fetches: Arc<RwLock<Vec<String>>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            info: Arc::new(RwLock::new(None)),
            fetch_behavior: Arc::new(RwLock::new(FetchBehavior::WriteFile {
                with_artifacts: false,
            })),
            fetch_error: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            searches: Arc::new(RwLock::new(Vec::new())),
            fetches: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the candidates returned by subsequent searches.
    pub async fn set_search_results(&self, results: Vec<SearchCandidate>) {
        *self.results.write().await = results;
    }

    /// Set the info returned by `fetch_info`.
    pub async fn set_info(&self, info: TrackInfo) {
        *self.info.write().await = Some(info);
    }

    /// Script the fetch-audio stage.
    pub async fn set_fetch_behavior(&self, behavior: FetchBehavior) {
        *self.fetch_behavior.write().await = behavior;
    }

    /// Set the error produced by the failing fetch behaviors.
    pub async fn set_fetch_error(&self, error: ExtractorError) {
        *self.fetch_error.write().await = Some(error);
    }

    /// Configure the next search or info call to fail with the given error.
    pub async fn set_next_error(&self, error: ExtractorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Queries passed to `search` so far.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// Video ids passed to `fetch_audio` so far.
    pub async fn recorded_fetches(&self) -> Vec<String> {
        self.fetches.read().await.clone()
    }

    async fn take_fetch_error(&self) -> ExtractorError {
        self.fetch_error
            .write()
            .await
            .take()
            .unwrap_or_else(|| ExtractorError::Failed("mock fetch failure".to_string()))
    }
}

#[async_trait]
impl MediaExtractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchCandidate>, ExtractorError> {
        self.searches.write().await.push(query.to_string());
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        let results = self.results.read().await;
        Ok(results.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_info(&self, video_id: &str) -> Result<TrackInfo, ExtractorError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        match self.info.read().await.clone() {
            Some(info) => Ok(info),
            None => Ok(TrackInfo {
                id: video_id.to_string(),
                title: "Mock Title".to_string(),
                channel: "Mock Channel".to_string(),
                upload_date: String::new(),
                album: None,
                genre: None,
                duration_secs: Some(200),
            }),
        }
    }

    async fn fetch_audio(
        &self,
        video_id: &str,
        output_path: &Path,
        events_tx: mpsc::Sender<ExtractorEvent>,
        cancel: &CancelToken,
    ) -> Result<(), ExtractorError> {
        self.fetches.write().await.push(video_id.to_string());

        let behavior = *self.fetch_behavior.read().await;
        match behavior {
            FetchBehavior::WriteFile { with_artifacts } => {
                let _ = events_tx
                    .send(ExtractorEvent::Downloading {
                        fraction: 0.42,
                        speed: Some("1.00MiB/s".to_string()),
                        eta: Some("00:03".to_string()),
                    })
                    .await;
                tokio::fs::write(output_path, b"fake audio data").await?;
                if with_artifacts {
                    tokio::fs::write(output_path.with_extension("webp"), b"thumb").await?;
                }
                let _ = events_tx.send(ExtractorEvent::DownloadFinished).await;
                let _ = events_tx
                    .send(ExtractorEvent::PostProcessing {
                        stage: PostProcessStage::Convert,
                        finished: false,
                    })
                    .await;
                Ok(())
            }
            FetchBehavior::WritePartialThenFail => {
                tokio::fs::write(output_path, b"partial").await?;
                let mut part = output_path.as_os_str().to_owned();
                part.push(".part");
                tokio::fs::write(std::path::PathBuf::from(part), b"partial").await?;
                Err(self.take_fetch_error().await)
            }
            FetchBehavior::Fail => Err(self.take_fetch_error().await),
            FetchBehavior::WriteNothing => Ok(()),
            FetchBehavior::WaitForCancel => {
                tokio::fs::write(output_path, b"partial").await?;
                for _ in 0..500 {
                    if cancel.is_cancelled() {
                        return Err(ExtractorError::Cancelled);
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(ExtractorError::Failed(
                    "mock was never cancelled".to_string(),
                ))
            }
        }
    }
}
