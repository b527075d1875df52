//! Configuration for the yt-dlp extraction backend.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// yt-dlp backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary (default: resolved from PATH).
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Explicit ffmpeg location handed to yt-dlp, when not on PATH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_location: Option<PathBuf>,

    /// Target audio container (default: "mp3").
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality passed to the transcoder (default: "192K").
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Embed the video thumbnail as cover art (default: true).
    #[serde(default = "default_embed_thumbnail")]
    pub embed_thumbnail: bool,

    /// Optional proxy, `host:port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// How many results to request from catalog search (default: 10).
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Hard timeout for a single backend invocation in seconds
    /// (default: 1800).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_embed_thumbnail() -> bool {
    true
}

fn default_search_limit() -> u32 {
    10
}

fn default_timeout() -> u64 {
    1800
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            ffmpeg_location: None,
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            embed_thumbnail: default_embed_thumbnail(),
            proxy: None,
            search_limit: default_search_limit(),
            timeout_secs: default_timeout(),
        }
    }
}
