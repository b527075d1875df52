//! Tag writing for downloaded audio files.
//!
//! Applies resolved metadata to the audio container via `lofty`. Only
//! non-empty fields are written. The commit is atomic: tags are written to
//! a temp copy which is then renamed over the original, so the file is
//! never left half-written.

use std::path::{Path, PathBuf};

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::prelude::{Accessor, AudioFile};
use lofty::probe::Probe;
use lofty::tag::Tag;
use thiserror::Error;
use tracing::debug;

use crate::metadata::TrackMetadata;

/// Errors while writing tags.
#[derive(Debug, Error)]
pub enum TagError {
    /// The audio container could not be opened or parsed.
    #[error("failed to read audio container: {0}")]
    Read(String),

    /// The tag store could not be saved.
    #[error("failed to write tags: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a tag write actually committed, plus file facts for display.
///
/// Field values mirror the metadata that was written; an empty string means
/// the field was skipped because the metadata did not carry it.
#[derive(Debug, Clone)]
pub struct AppliedTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub genre: String,
    pub path: PathBuf,
    /// Container format, e.g. "Mpeg".
    pub format: String,
    pub duration_secs: u64,
    pub size_bytes: u64,
}

/// Writes resolved metadata into audio containers.
pub struct TagWriter;

impl TagWriter {
    /// Apply `metadata` to the file at `path`.
    ///
    /// Creates an empty tag store when the file has none. Either every
    /// non-empty field is committed or the file is untouched.
    pub fn write(path: &Path, metadata: &TrackMetadata) -> Result<AppliedTags, TagError> {
        let tmp = temp_sibling(path);
        std::fs::copy(path, &tmp)?;

        let result = Self::write_via_temp(&tmp, path, metadata);
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }

    fn write_via_temp(
        tmp: &Path,
        final_path: &Path,
        metadata: &TrackMetadata,
    ) -> Result<AppliedTags, TagError> {
        let mut tagged = Probe::open(tmp)
            .map_err(|e| TagError::Read(e.to_string()))?
            .read()
            .map_err(|e| TagError::Read(e.to_string()))?;

        if tagged.primary_tag_mut().is_none() {
            debug!("no tag store found, creating one");
            tagged.insert_tag(Tag::new(tagged.primary_tag_type()));
        }
        let tag = tagged
            .primary_tag_mut()
            .expect("tag store was just inserted");

        let applied = apply_fields(tag, metadata);

        tagged
            .save_to_path(tmp, WriteOptions::default())
            .map_err(|e| TagError::Write(e.to_string()))?;

        let duration_secs = tagged.properties().duration().as_secs();
        let format = format!("{:?}", tagged.file_type());

        std::fs::rename(tmp, final_path)?;
        let size_bytes = std::fs::metadata(final_path)?.len();

        Ok(AppliedTags {
            title: applied.0,
            artist: applied.1,
            album: applied.2,
            year: applied.3,
            genre: applied.4,
            path: final_path.to_path_buf(),
            format,
            duration_secs,
            size_bytes,
        })
    }
}

/// Set every non-empty metadata field on the tag. Returns the values that
/// were written, in (title, artist, album, year, genre) order.
fn apply_fields(tag: &mut Tag, metadata: &TrackMetadata) -> (String, String, String, String, String) {
    if !metadata.title.is_empty() {
        tag.set_title(metadata.title.clone());
    }
    if !metadata.artist.is_empty() {
        tag.set_artist(metadata.artist.clone());
    }
    if !metadata.album.is_empty() {
        tag.set_album(metadata.album.clone());
    }
    let mut year_written = String::new();
    if !metadata.year.is_empty() {
        if let Ok(year) = metadata.year.parse::<u32>() {
            tag.set_year(year);
            year_written = metadata.year.clone();
        }
    }
    if !metadata.genre.is_empty() {
        tag.set_genre(metadata.genre.clone());
    }
    (
        metadata.title.clone(),
        metadata.artist.clone(),
        metadata.album.clone(),
        year_written,
        metadata.genre.clone(),
    )
}

/// A temp path next to the target, sharing its filename stem so failure
/// cleanup sweeps it up too.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tagtmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;
    use tempfile::TempDir;

    #[test]
    fn test_apply_fields_sets_non_empty_values() {
        let mut tag = Tag::new(TagType::Id3v2);
        let metadata = TrackMetadata {
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            year: "2011".to_string(),
            genre: "rock".to_string(),
        };

        apply_fields(&mut tag, &metadata);

        assert_eq!(tag.title().as_deref(), Some("Title"));
        assert_eq!(tag.artist().as_deref(), Some("Artist"));
        assert_eq!(tag.album().as_deref(), Some("Album"));
        assert_eq!(tag.year(), Some(2011));
        assert_eq!(tag.genre().as_deref(), Some("rock"));
    }

    #[test]
    fn test_apply_fields_skips_empty_values() {
        let mut tag = Tag::new(TagType::Id3v2);
        let metadata = TrackMetadata::fallback("Only Title", "Only Artist");

        let applied = apply_fields(&mut tag, &metadata);

        assert_eq!(tag.title().as_deref(), Some("Only Title"));
        assert!(tag.album().is_none());
        assert!(tag.year().is_none());
        assert!(tag.genre().is_none());
        assert_eq!(applied.2, "");
        assert_eq!(applied.3, "");
    }

    #[test]
    fn test_apply_fields_rejects_non_numeric_year() {
        let mut tag = Tag::new(TagType::Id3v2);
        let mut metadata = TrackMetadata::fallback("T", "A");
        metadata.year = "n/a!".to_string();

        let applied = apply_fields(&mut tag, &metadata);

        assert!(tag.year().is_none());
        assert_eq!(applied.3, "");
    }

    #[test]
    fn test_temp_sibling_shares_stem() {
        let tmp = temp_sibling(Path::new("/music/Artist/Song.mp3"));
        assert_eq!(tmp, Path::new("/music/Artist/Song.mp3.tagtmp"));
        assert!(tmp
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Song."));
    }

    #[test]
    fn test_write_on_non_audio_file_fails_and_leaves_original() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.mp3");
        std::fs::write(&path, b"this is not an mp3").unwrap();

        let metadata = TrackMetadata::fallback("T", "A");
        let result = TagWriter::write(&path, &metadata);

        assert!(matches!(result, Err(TagError::Read(_))));
        // Original untouched, temp copy cleaned up.
        assert_eq!(std::fs::read(&path).unwrap(), b"this is not an mp3");
        assert!(!temp.path().join("fake.mp3.tagtmp").exists());
    }

    #[test]
    fn test_write_on_missing_file_fails_with_io() {
        let metadata = TrackMetadata::fallback("T", "A");
        let result = TagWriter::write(Path::new("/nonexistent/file.mp3"), &metadata);
        assert!(matches!(result, Err(TagError::Io(_))));
    }
}
