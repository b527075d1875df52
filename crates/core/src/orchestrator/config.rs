//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the download orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Resolve metadata against the lookup service. When disabled, tags
    /// and paths come straight from the extraction info.
    #[serde(default = "default_fetch_metadata")]
    pub fetch_metadata: bool,

    /// Target audio format, which is also the extension of the resolved
    /// output path. Must match what the extraction backend transcodes to
    /// (default: "mp3").
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
}

fn default_fetch_metadata() -> bool {
    true
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_metadata: default_fetch_metadata(),
            audio_format: default_audio_format(),
        }
    }
}
