//! Types for metadata lookup and resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolved tag data for one track. Empty string means unknown.
///
/// A non-empty `year` is always exactly four characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub genre: String,
}

impl TrackMetadata {
    /// Metadata synthesized from the track's own title and channel, used
    /// when no confident external match exists.
    pub fn fallback(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: String::new(),
            year: String::new(),
            genre: String::new(),
        }
    }
}

/// Extracts a 4-character year from a date string like "2011-05-09" or
/// "20110509". Returns an empty string when the input carries no year.
pub fn year_from_date(date: &str) -> String {
    let prefix: String = date.chars().take(4).collect();
    if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
        prefix
    } else {
        String::new()
    }
}

/// A recording record from the metadata lookup service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    pub title: String,
    /// Joined artist-credit phrase ("Artist A & Artist B").
    pub artist_credit: String,
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Folksonomy tags, most popular first.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub isrcs: Vec<String>,
}

/// A release (album/EP/single/...) a recording appears on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
    pub title: String,
    /// Release date, "YYYY", "YYYY-MM" or "YYYY-MM-DD".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Release-group primary type ("Album", "EP", "Single", "Compilation").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group_type: Option<String>,
    /// Whether front cover art is known to be available.
    #[serde(default)]
    pub cover_art_front: bool,
}

/// Errors from the metadata lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup service rate limit exceeded")]
    RateLimitExceeded,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lookup API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("failed to parse lookup response: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_has_empty_optional_fields() {
        let m = TrackMetadata::fallback("Title", "Artist");
        assert_eq!(m.title, "Title");
        assert_eq!(m.artist, "Artist");
        assert_eq!(m.album, "");
        assert_eq!(m.year, "");
        assert_eq!(m.genre, "");
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("2011-05-09"), "2011");
        assert_eq!(year_from_date("20110509"), "2011");
        assert_eq!(year_from_date("2011"), "2011");
        assert_eq!(year_from_date(""), "");
        assert_eq!(year_from_date("abc"), "");
        assert_eq!(year_from_date("20a1-05-09"), "");
    }
}
