//! Testing utilities and mock implementations.
//!
//! Mock implementations of the external service traits, allowing the
//! search and download pipeline to be tested end to end without a network
//! or the yt-dlp binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use tracktor_core::testing::{fixtures, FetchBehavior, MockExtractor, MockLookup};
//!
//! let extractor = MockExtractor::new();
//! extractor.set_search_results(vec![
//!     fixtures::candidate("id1", "Test Song (Official Audio)", "Test Artist", 200),
//! ]).await;
//! extractor.set_fetch_behavior(FetchBehavior::WriteFile { with_artifacts: true }).await;
//!
//! let lookup = MockLookup::new();
//! lookup.set_recordings(vec![fixtures::recording("Song", "Artist", Some("Album"))]).await;
//! ```

mod mock_extractor;
mod mock_lookup;

pub use mock_extractor::{FetchBehavior, MockExtractor};
pub use mock_lookup::MockLookup;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::extractor::{SearchCandidate, TrackInfo};
    use crate::metadata::{Recording, Release};

    /// Create a search candidate with reasonable defaults.
    pub fn candidate(id: &str, title: &str, channel: &str, duration_secs: u64) -> SearchCandidate {
        SearchCandidate {
            id: id.to_string(),
            title: title.to_string(),
            channel: channel.to_string(),
            duration_secs,
            view_count: None,
            like_count: None,
            dislike_count: None,
            channel_verified: false,
        }
    }

    /// Create track info with reasonable defaults.
    pub fn track_info(id: &str, title: &str, channel: &str, upload_date: &str) -> TrackInfo {
        TrackInfo {
            id: id.to_string(),
            title: title.to_string(),
            channel: channel.to_string(),
            upload_date: upload_date.to_string(),
            album: None,
            genre: None,
            duration_secs: Some(200),
        }
    }

    /// Create a recording; when an album is given it becomes a single
    /// "Album"-typed release.
    pub fn recording(title: &str, artist: &str, album: Option<&str>) -> Recording {
        Recording {
            title: title.to_string(),
            artist_credit: artist.to_string(),
            releases: album
                .map(|a| vec![release(a, None, Some("Album"), false)])
                .unwrap_or_default(),
            tags: Vec::new(),
            isrcs: Vec::new(),
        }
    }

    /// Create a release.
    pub fn release(
        title: &str,
        date: Option<&str>,
        release_group_type: Option<&str>,
        cover_art_front: bool,
    ) -> Release {
        Release {
            title: title.to_string(),
            date: date.map(|d| d.to_string()),
            release_group_type: release_group_type.map(|t| t.to_string()),
            cover_art_front,
        }
    }
}
