use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extractor::YtDlpConfig;
use crate::metadata::MusicBrainzConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub lookup: MusicBrainzConfig,
    #[serde(default)]
    pub extractor: YtDlpConfig,
}

/// Download destination and behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Root of the local music library.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Place tracks under `artist/[album/]` directories.
    #[serde(default = "default_true")]
    pub organize_by_artist: bool,
    /// Resolve metadata against the lookup service before tagging.
    #[serde(default = "default_true")]
    pub fetch_metadata: bool,
    /// Concurrent download budget for the embedding application. The
    /// orchestrator itself does not enforce it; admission control sits in
    /// front of it.
    #[serde(default = "default_max_downloads")]
    pub max_downloads: u32,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            organize_by_artist: true,
            fetch_metadata: true,
            max_downloads: default_max_downloads(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloaded")
}

fn default_true() -> bool {
    true
}

fn default_max_downloads() -> u32 {
    1
}

/// Content filter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Enable profanity filtering of search results and filenames.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
