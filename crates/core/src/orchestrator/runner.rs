//! Download orchestrator implementation.
//!
//! Drives one task through the pipeline:
//! fetch info -> resolve destination -> fetch + transcode -> verify ->
//! tag -> clean up. Cancellation is checked before every stage; partial
//! files never survive a failed or cancelled task.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::extractor::{ExtractorEvent, MediaExtractor, PostProcessStage, TrackInfo};
use crate::metadata::{year_from_date, MetadataResolver, PathParts, TrackMetadata};
use crate::normalizer::normalize_title;
use crate::placer::{purge_artifacts, purge_stem, PathResolver};
use crate::tagger::TagWriter;

use super::config::OrchestratorConfig;
use super::types::{DownloadError, DownloadTask, ProgressUpdate};

/// The download orchestrator: one instance serves many tasks, but each
/// `download` call owns its task state exclusively. The only state shared
/// with the caller is the cancel token it passed in.
pub struct DownloadOrchestrator {
    config: OrchestratorConfig,
    extractor: Arc<dyn MediaExtractor>,
    resolver: MetadataResolver,
    paths: PathResolver,
}

impl DownloadOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        extractor: Arc<dyn MediaExtractor>,
        resolver: MetadataResolver,
        paths: PathResolver,
    ) -> Self {
        Self {
            config,
            extractor,
            resolver,
            paths,
        }
    }

    /// Download one track to its canonical path.
    ///
    /// Progress updates flow through `progress`; a dropped receiver never
    /// stalls the task. Setting `cancel` aborts the task at the next
    /// checkpoint (or mid-transfer), with cleanup still performed. On any
    /// error, partial files sharing the output stem are removed before the
    /// error is returned, and the last progress update carries the
    /// user-facing failure text.
    pub async fn download(
        &self,
        video_id: &str,
        progress: mpsc::Sender<ProgressUpdate>,
        cancel: CancelToken,
    ) -> Result<PathBuf, DownloadError> {
        let mut task = DownloadTask::new(video_id, cancel);
        info!(task_id = %task.id, video_id, "starting download task");

        match self.run(&mut task, &progress).await {
            Ok(path) => {
                send(&progress, ProgressUpdate::info("Download complete!", 1.0)).await;
                info!(task_id = %task.id, path = %path.display(), "download completed");
                Ok(path)
            }
            Err(err) => {
                if let Some(path) = &task.output_path {
                    let removed = purge_stem(path).await;
                    debug!(task_id = %task.id, removed, "removed partial files");
                }
                let update = match &err {
                    DownloadError::Cancelled => ProgressUpdate::info("Download cancelled", 0.0),
                    other => ProgressUpdate::info(other.to_string(), 0.0),
                };
                send(&progress, update).await;
                warn!(task_id = %task.id, "download task ended: {err}");
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        task: &mut DownloadTask,
        progress: &mpsc::Sender<ProgressUpdate>,
    ) -> Result<PathBuf, DownloadError> {
        send(progress, ProgressUpdate::info("Starting download...", 0.0)).await;
        task.check_cancelled()?;

        // FetchingInfo: remote metadata only, no media bytes yet.
        send(progress, ProgressUpdate::info("Fetching track info...", 0.05)).await;
        let track_info = self.extractor.fetch_info(&task.video_id).await?;
        task.check_cancelled()?;

        // Resolving: canonical destination from best-effort metadata.
        send(
            progress,
            ProgressUpdate::info("Resolving destination...", 0.08),
        )
        .await;
        let title = normalize_title(&track_info.title);
        let parts = if self.config.fetch_metadata {
            self.resolver
                .resolve_path_parts(&title, &track_info.channel)
                .await
        } else {
            PathParts {
                artist: track_info.channel.clone(),
                title: title.clone(),
                album: None,
            }
        };
        let output_path = self
            .paths
            .resolve_track_path(
                &parts.artist,
                parts.album.as_deref(),
                &parts.title,
                &task.id,
                &self.config.audio_format,
            )
            .await?;
        debug!(task_id = %task.id, path = %output_path.display(), "resolved output path");
        task.output_path = Some(output_path.clone());
        task.check_cancelled()?;

        // Downloading: the extraction service writes straight to the
        // resolved path; its events are remapped onto overall progress.
        let (events_tx, events_rx) = mpsc::channel(32);
        let forwarder = tokio::spawn(forward_events(events_rx, progress.clone()));
        let fetch_result = self
            .extractor
            .fetch_audio(&task.video_id, &output_path, events_tx, &task.cancel)
            .await;
        let _ = forwarder.await;
        fetch_result?;
        task.check_cancelled()?;

        // The service reported success; the file must actually be there.
        if !fs::try_exists(&output_path).await.unwrap_or(false) {
            error!(task_id = %task.id, "expected audio file missing at {}", output_path.display());
            return Err(DownloadError::TranscodeMissing { path: output_path });
        }

        // Tagging: failures are reported as a warning, never fatal.
        let metadata = self.build_metadata(&track_info, &title).await;
        send(
            progress,
            ProgressUpdate::info("Finalizing metadata...", 0.95),
        )
        .await;
        let tag_path = output_path.clone();
        match tokio::task::spawn_blocking(move || TagWriter::write(&tag_path, &metadata)).await {
            Ok(Ok(applied)) => {
                info!(task_id = %task.id, title = %applied.title, artist = %applied.artist, "wrote tags");
            }
            Ok(Err(e)) => {
                warn!(task_id = %task.id, "failed to write tags: {e}");
                send(
                    progress,
                    ProgressUpdate::warning(
                        "Warning: tag update failed, but download succeeded",
                        0.95,
                    ),
                )
                .await;
            }
            Err(e) => {
                warn!(task_id = %task.id, "tag writer task failed: {e}");
                send(
                    progress,
                    ProgressUpdate::warning(
                        "Warning: tag update failed, but download succeeded",
                        0.95,
                    ),
                )
                .await;
            }
        }

        // CleaningUp: sweep thumbnail/image leftovers next to the track.
        send(progress, ProgressUpdate::info("Cleaning up...", 0.98)).await;
        purge_artifacts(&output_path).await;

        Ok(output_path)
    }

    /// Resolved metadata for tagging, with gaps filled from the extraction
    /// info itself.
    async fn build_metadata(&self, track_info: &TrackInfo, title: &str) -> TrackMetadata {
        let mut metadata = if self.config.fetch_metadata {
            self.resolver.resolve(&track_info.channel, title).await
        } else {
            TrackMetadata::fallback(title, track_info.channel.clone())
        };

        if metadata.album.is_empty() {
            if let Some(album) = &track_info.album {
                metadata.album = album.clone();
            }
        }
        if metadata.genre.is_empty() {
            if let Some(genre) = &track_info.genre {
                metadata.genre = genre.clone();
            }
        }
        if metadata.year.is_empty() {
            metadata.year = year_from_date(&track_info.upload_date);
        }
        metadata
    }
}

/// Remaps extractor events onto overall task progress: transfer covers
/// `[0, 0.70]`, post-processing `[0.70, 0.95]`.
async fn forward_events(
    mut events: mpsc::Receiver<ExtractorEvent>,
    progress: mpsc::Sender<ProgressUpdate>,
) {
    while let Some(event) = events.recv().await {
        let update = match event {
            ExtractorEvent::Downloading {
                fraction,
                speed,
                eta,
            } => {
                let mut status = format!("Downloading: {:.1}%", fraction * 100.0);
                if let Some(speed) = speed {
                    status.push_str(&format!(" @ {speed}"));
                }
                if let Some(eta) = eta {
                    status.push_str(&format!(" (ETA: {eta})"));
                }
                ProgressUpdate::info(status, (fraction * 0.70).clamp(0.0, 0.70))
            }
            ExtractorEvent::DownloadFinished => {
                ProgressUpdate::info("Download complete, starting conversion...", 0.75)
            }
            ExtractorEvent::PostProcessing { stage, finished } => {
                let (status, fraction) = match (stage, finished) {
                    (PostProcessStage::Convert, false) => ("Converting audio...", 0.80),
                    (PostProcessStage::Convert, true) => ("Audio conversion complete", 0.85),
                    (PostProcessStage::EmbedThumbnail, false) => ("Adding album artwork...", 0.85),
                    (PostProcessStage::EmbedThumbnail, true) => ("Album artwork added", 0.90),
                    (PostProcessStage::EmbedMetadata, false) => ("Adding metadata tags...", 0.90),
                    (PostProcessStage::EmbedMetadata, true) => ("Metadata added", 0.95),
                };
                ProgressUpdate::info(status, fraction)
            }
        };
        if progress.send(update).await.is_err() {
            break;
        }
    }
}

async fn send(progress: &mpsc::Sender<ProgressUpdate>, update: ProgressUpdate) {
    // A caller that dropped its receiver just stops getting updates.
    let _ = progress.send(update).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ContentFilter;
    use crate::extractor::ExtractorError;
    use crate::orchestrator::types::ProgressLevel;
    use crate::testing::{fixtures, FetchBehavior, MockExtractor, MockLookup};
    use std::path::Path;
    use tempfile::TempDir;

    fn orchestrator_with(
        base: &Path,
        extractor: MockExtractor,
        lookup: MockLookup,
    ) -> DownloadOrchestrator {
        DownloadOrchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(extractor),
            MetadataResolver::new(Arc::new(lookup)),
            PathResolver::new(base, ContentFilter::new(false), true),
        )
    }

    fn progress_channel() -> (
        mpsc::Sender<ProgressUpdate>,
        mpsc::Receiver<ProgressUpdate>,
    ) {
        mpsc::channel(256)
    }

    fn drain(rx: &mut mpsc::Receiver<ProgressUpdate>) -> Vec<ProgressUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    fn count_files(dir: &Path) -> usize {
        let mut count = 0;
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                count += count_files(&path);
            } else {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_successful_download_with_tag_warning() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info(
                "vid1",
                "Test Artist - Test Song (Official Audio)",
                "Test Artist",
                "20200101",
            ))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WriteFile { with_artifacts: true })
            .await;

        let orchestrator = orchestrator_with(temp.path(), extractor, MockLookup::new());
        let (tx, mut rx) = progress_channel();

        let path = orchestrator
            .download("vid1", tx, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(path, temp.path().join("Test Artist/Test Song.mp3"));
        assert!(path.exists());
        // Thumbnail artifact swept during cleanup.
        assert!(!path.with_extension("webp").exists());

        let updates = drain(&mut rx);
        let last = updates.last().unwrap();
        assert_eq!(last.status, "Download complete!");
        assert_eq!(last.fraction, 1.0);

        // The fake audio bytes are untaggable, so the task completed with
        // a warning rather than failing.
        let warning_idx = updates
            .iter()
            .position(|u| u.level == ProgressLevel::Warning)
            .expect("tag warning observed");
        assert!(warning_idx < updates.len() - 1);
    }

    #[tokio::test]
    async fn test_download_maps_extractor_progress() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Chan", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WriteFile { with_artifacts: false })
            .await;

        let orchestrator = orchestrator_with(temp.path(), extractor, MockLookup::new());
        let (tx, mut rx) = progress_channel();
        orchestrator
            .download("vid1", tx, CancelToken::new())
            .await
            .unwrap();

        let updates = drain(&mut rx);
        let downloading = updates
            .iter()
            .find(|u| u.status.starts_with("Downloading:"))
            .expect("transfer progress forwarded");
        assert!(downloading.fraction <= 0.70);
    }

    #[tokio::test]
    async fn test_cancel_before_start_leaves_no_files() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        let orchestrator = orchestrator_with(temp.path(), extractor, MockLookup::new());
        let (tx, mut rx) = progress_channel();

        let result = orchestrator.download("vid1", tx, cancel).await;

        assert!(matches!(result, Err(DownloadError::Cancelled)));
        assert_eq!(count_files(temp.path()), 0);
        let updates = drain(&mut rx);
        assert_eq!(updates.last().unwrap().status, "Download cancelled");
    }

    #[tokio::test]
    async fn test_failure_after_download_purges_stem() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Chan", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WritePartialThenFail)
            .await;

        let orchestrator = orchestrator_with(temp.path(), extractor, MockLookup::new());
        let (tx, mut rx) = progress_channel();

        let result = orchestrator.download("vid1", tx, CancelToken::new()).await;

        assert!(matches!(result, Err(DownloadError::Extractor(_))));
        // Nothing sharing the output stem survives, whatever the extension.
        assert_eq!(count_files(temp.path()), 0);
        let updates = drain(&mut rx);
        assert_eq!(updates.last().unwrap().fraction, 0.0);
    }

    #[tokio::test]
    async fn test_blocked_error_reaches_caller_with_message() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Chan", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::Fail)
            .await;
        extractor.set_fetch_error(ExtractorError::Blocked).await;

        let orchestrator = orchestrator_with(temp.path(), extractor, MockLookup::new());
        let (tx, mut rx) = progress_channel();

        let result = orchestrator.download("vid1", tx, CancelToken::new()).await;

        assert!(matches!(result, Err(DownloadError::Blocked)));
        let updates = drain(&mut rx);
        assert!(updates.last().unwrap().status.contains("blocking"));
    }

    #[tokio::test]
    async fn test_missing_converted_file_is_a_hard_failure() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Chan", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WriteNothing)
            .await;

        let orchestrator = orchestrator_with(temp.path(), extractor, MockLookup::new());
        let (tx, _rx) = progress_channel();

        let result = orchestrator.download("vid1", tx, CancelToken::new()).await;
        assert!(matches!(result, Err(DownloadError::TranscodeMissing { .. })));
    }

    #[tokio::test]
    async fn test_configured_format_drives_output_extension() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Chan", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WriteFile { with_artifacts: false })
            .await;

        let orchestrator = DownloadOrchestrator::new(
            OrchestratorConfig {
                fetch_metadata: true,
                audio_format: "opus".to_string(),
            },
            Arc::new(extractor),
            MetadataResolver::new(Arc::new(MockLookup::new())),
            PathResolver::new(temp.path(), ContentFilter::new(false), true),
        );
        let (tx, _rx) = progress_channel();

        let path = orchestrator
            .download("vid1", tx, CancelToken::new())
            .await
            .unwrap();

        // Path, existence check and cleanup all follow the configured
        // format, not a hardcoded mp3.
        assert_eq!(path, temp.path().join("Chan/Song.opus"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_cancel_during_download_cleans_up() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Chan", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WaitForCancel)
            .await;

        let orchestrator = Arc::new(orchestrator_with(temp.path(), extractor, MockLookup::new()));
        let (tx, mut rx) = progress_channel();
        let cancel = CancelToken::new();

        let handle = {
            let orchestrator = orchestrator.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { orchestrator.download("vid1", tx, cancel).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cancel.cancel();
        let result = handle.await.unwrap();

        assert!(matches!(result, Err(DownloadError::Cancelled)));
        assert_eq!(count_files(temp.path()), 0);
        let updates = drain(&mut rx);
        assert_eq!(updates.last().unwrap().status, "Download cancelled");
    }

    #[tokio::test]
    async fn test_resolved_metadata_shapes_the_path() {
        let temp = TempDir::new().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_info(fixtures::track_info("vid1", "Song", "Real Artist", ""))
            .await;
        extractor
            .set_fetch_behavior(FetchBehavior::WriteFile { with_artifacts: false })
            .await;

        let lookup = MockLookup::new();
        lookup
            .set_recordings(vec![fixtures::recording(
                "Song",
                "Real Artist",
                Some("Great Album"),
            )])
            .await;

        let orchestrator = orchestrator_with(temp.path(), extractor, lookup);
        let (tx, _rx) = progress_channel();

        let path = orchestrator
            .download("vid1", tx, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(
            path,
            temp.path().join("Real Artist/Great Album/Song.mp3")
        );
    }
}
