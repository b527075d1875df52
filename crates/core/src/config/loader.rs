use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRACKTOR_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[downloads]
base_dir = "/music/library"

[extractor]
audio_quality = "320K"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.downloads.base_dir, PathBuf::from("/music/library"));
        assert_eq!(config.extractor.audio_quality, "320K");
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.filter.enabled);
        assert_eq!(config.extractor.audio_format, "mp3");
    }

    #[test]
    fn test_load_config_from_str_rejects_bad_toml() {
        let result = load_config_from_str("downloads = nope");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[downloads]
base_dir = "/srv/music"
max_downloads = 3

[lookup]
rate_limit_ms = 2000
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.downloads.base_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.downloads.max_downloads, 3);
        assert_eq!(config.lookup.rate_limit_ms, 2000);
    }
}
