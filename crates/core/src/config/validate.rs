use super::{types::Config, ConfigError};

/// Audio formats the extraction backend can transcode to. The format name
/// doubles as the output file extension, so only formats where the two
/// coincide are allowed (vorbis, for one, comes back as `.ogg`).
const SUPPORTED_AUDIO_FORMATS: &[&str] = &["mp3", "m4a", "opus", "flac", "wav"];

/// Validate a loaded configuration.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.downloads.base_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads.base_dir must not be empty".to_string(),
        ));
    }

    if !SUPPORTED_AUDIO_FORMATS.contains(&config.extractor.audio_format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "extractor.audio_format '{}' is not supported (expected one of {})",
            config.extractor.audio_format,
            SUPPORTED_AUDIO_FORMATS.join(", ")
        )));
    }

    if config.extractor.search_limit == 0 {
        return Err(ConfigError::ValidationError(
            "extractor.search_limit must be at least 1".to_string(),
        ));
    }

    if config.lookup.user_agent.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "lookup.user_agent must not be empty".to_string(),
        ));
    }

    Ok(())
}
