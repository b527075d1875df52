//! Library front door: wires the engine together from configuration.
//!
//! Embedding applications that do not need custom backends can build
//! everything from a [`Config`] and use the two entry points directly;
//! anything fancier assembles [`TrackSearcher`] and
//! [`DownloadOrchestrator`] by hand.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use crate::cancel::CancelToken;
use crate::config::{validate_config, Config};
use crate::extractor::{MediaExtractor, YtDlpExtractor};
use crate::filter::ContentFilter;
use crate::metadata::{MetadataResolver, MusicBrainzClient};
use crate::orchestrator::{
    DownloadError, DownloadOrchestrator, OrchestratorConfig, ProgressUpdate,
};
use crate::placer::PathResolver;
use crate::searcher::{ScoredCandidate, TrackSearcher};

/// A fully wired search-and-download engine.
pub struct Engine {
    searcher: TrackSearcher,
    orchestrator: DownloadOrchestrator,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine with the yt-dlp and MusicBrainz backends.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        validate_config(config).context("invalid configuration")?;

        let filter = ContentFilter::new(config.filter.enabled);
        let extractor: Arc<dyn MediaExtractor> =
            Arc::new(YtDlpExtractor::new(config.extractor.clone()));
        let lookup = MusicBrainzClient::new(config.lookup.clone())
            .context("failed to build metadata lookup client")?;

        let searcher = TrackSearcher::new(
            extractor.clone(),
            filter.clone(),
            config.extractor.search_limit,
        );
        let orchestrator = DownloadOrchestrator::new(
            OrchestratorConfig {
                fetch_metadata: config.downloads.fetch_metadata,
                audio_format: config.extractor.audio_format.clone(),
            },
            extractor,
            MetadataResolver::new(Arc::new(lookup)),
            PathResolver::new(
                config.downloads.base_dir.clone(),
                filter,
                config.downloads.organize_by_artist,
            ),
        );

        Ok(Self {
            searcher,
            orchestrator,
        })
    }

    /// Search the catalog; scored candidates come back best-first.
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<ScoredCandidate>> {
        Ok(self.searcher.search(query).await?)
    }

    /// Download one track to its canonical path.
    pub async fn download(
        &self,
        video_id: &str,
        progress: mpsc::Sender<ProgressUpdate>,
        cancel: CancelToken,
    ) -> Result<PathBuf, DownloadError> {
        self.orchestrator.download(video_id, progress, cancel).await
    }
}
