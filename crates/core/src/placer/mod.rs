//! Canonical output paths and filesystem cleanup.
//!
//! `PathResolver` turns resolved artist/album/title into the final,
//! sanitized location under the music directory, creating intermediate
//! directories. The purge helpers remove partial files and extraction
//! artifacts so no task leaves orphans behind, whatever its outcome.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::filter::ContentFilter;

/// Thumbnail/image formats the extraction backend may leave next to the
/// audio file.
const ARTIFACT_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png"];

/// Errors from path resolution.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Output directory could not be created.
    #[error("failed to create output directory {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves canonical, sanitized output paths.
pub struct PathResolver {
    base_dir: PathBuf,
    filter: ContentFilter,
    organize_by_artist: bool,
}

impl PathResolver {
    pub fn new(base_dir: impl Into<PathBuf>, filter: ContentFilter, organize_by_artist: bool) -> Self {
        Self {
            base_dir: base_dir.into(),
            filter,
            organize_by_artist,
        }
    }

    /// Compute `base / artist / [album /] title.<extension>` from resolved
    /// names, creating the directories on the way. The extension is the
    /// target audio format the extraction backend transcodes to.
    ///
    /// Components are sanitized; an artist that sanitizes to nothing
    /// becomes "Unknown Artist" and a title that sanitizes to nothing falls
    /// back to `fallback_stem`, so the result is always a usable path.
    pub async fn resolve_track_path(
        &self,
        artist: &str,
        album: Option<&str>,
        title: &str,
        fallback_stem: &str,
        extension: &str,
    ) -> Result<PathBuf, PlacerError> {
        let mut dir = self.base_dir.clone();

        if self.organize_by_artist {
            let artist = self.filter.clean_filename(artist);
            let artist = if artist.is_empty() {
                "Unknown Artist".to_string()
            } else {
                artist
            };
            dir.push(artist);

            if let Some(album) = album {
                let album = self.filter.clean_filename(album);
                if !album.is_empty() {
                    dir.push(album);
                }
            }
        }

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: dir.clone(),
                source: e,
            })?;

        let title = self.filter.clean_filename(title);
        let stem = if title.is_empty() {
            fallback_stem.to_string()
        } else {
            title
        };

        Ok(dir.join(format!("{stem}.{extension}")))
    }
}

/// Remove every file sharing `path`'s stem, whatever the extension.
///
/// Used after a failed or cancelled download so no partial container or
/// half-transcoded file survives. Returns how many files were removed;
/// individual failures are logged, not escalated.
pub async fn purge_stem(path: &Path) -> usize {
    let (Some(parent), Some(stem)) = (path.parent(), path.file_stem()) else {
        return 0;
    };
    // Matches the whole `<stem>.*` family, including double extensions
    // like `Song.mp3.part`.
    let prefix = format!("{}.", stem.to_string_lossy());

    let mut removed = 0;
    let mut entries = match fs::read_dir(parent).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to scan {} for cleanup: {e}", parent.display());
            return 0;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let entry_path = entry.path();
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(&prefix) {
            continue;
        }
        match fs::remove_file(&entry_path).await {
            Ok(()) => {
                debug!("removed partial file {}", entry_path.display());
                removed += 1;
            }
            Err(e) => warn!("failed to remove {}: {e}", entry_path.display()),
        }
    }
    removed
}

/// Remove thumbnail/image siblings the extraction backend left next to the
/// final audio file. Files already absent are ignored; permission errors
/// are logged, not escalated.
pub async fn purge_artifacts(path: &Path) {
    for ext in ARTIFACT_EXTENSIONS {
        let artifact = path.with_extension(ext);
        match fs::remove_file(&artifact).await {
            Ok(()) => debug!("removed artifact {}", artifact.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove artifact {}: {e}", artifact.display()),
        }
    }
}
