//! Metadata lookup and resolution.
//!
//! The [`RecordingLookup`] trait is the boundary to the remote metadata
//! service; [`MusicBrainzClient`] is the production backend and
//! [`MetadataResolver`] layers the search strategies and match scoring on
//! top. Lookups are always live; there is no persistent cache.

mod musicbrainz;
mod resolver;
mod traits;
mod types;

pub use musicbrainz::{MusicBrainzClient, MusicBrainzConfig};
pub use resolver::{best_release, score_match, MetadataResolver, PathParts};
pub use traits::RecordingLookup;
pub use types::{year_from_date, LookupError, Recording, Release, TrackMetadata};
