//! Metadata resolution against the lookup service.
//!
//! Layered search strategies with a word-overlap matching score. Lookup
//! failures never escape: every resolve degrades to metadata synthesized
//! from the track's own title and channel.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::normalizer::normalize_title;

use super::traits::RecordingLookup;
use super::types::{year_from_date, Recording, Release, TrackMetadata};

/// Minimum match score when the query constrained both artist and title.
const ARTIST_TITLE_THRESHOLD: f64 = 0.70;
/// Minimum match score for a title-only query; higher because the artist
/// is unconstrained.
const TITLE_ONLY_THRESHOLD: f64 = 0.80;

/// Artist/title/album components used to build the canonical path.
#[derive(Debug, Clone)]
pub struct PathParts {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
}

/// Resolves authoritative track metadata with layered lookup strategies.
pub struct MetadataResolver {
    lookup: Arc<dyn RecordingLookup>,
}

impl MetadataResolver {
    pub fn new(lookup: Arc<dyn RecordingLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve full tag metadata for an artist/title pair.
    ///
    /// Strategy A constrains both artist and title; strategy B retries with
    /// the title alone at a higher acceptance bar. Never fails: with no
    /// acceptable match (or a broken lookup service) the result is fallback
    /// metadata built from the inputs.
    pub async fn resolve(&self, artist: &str, title: &str) -> TrackMetadata {
        let title = normalize_title(title);
        let artist = artist.trim();

        let query = format!(r#"artist:"{artist}" AND recording:"{title}""#);
        if let Some(recording) = self
            .best_acceptable(&query, 5, artist, &title, ARTIST_TITLE_THRESHOLD)
            .await
        {
            return metadata_from(&recording, &title, artist);
        }

        let query = format!(r#"recording:"{title}""#);
        if let Some(recording) = self
            .best_acceptable(&query, 10, artist, &title, TITLE_ONLY_THRESHOLD)
            .await
        {
            return metadata_from(&recording, &title, artist);
        }

        debug!(artist, %title, "no confident metadata match, using fallback");
        TrackMetadata::fallback(title, artist)
    }

    /// Resolve the artist/title/album components for the output path.
    ///
    /// Uses a title-only query scored against the channel name; falls back
    /// to the channel and normalized title themselves.
    pub async fn resolve_path_parts(&self, title: &str, channel: &str) -> PathParts {
        let title = normalize_title(title);

        let query = format!(r#"recording:"{title}""#);
        if let Some(recording) = self
            .best_acceptable(&query, 5, channel, &title, ARTIST_TITLE_THRESHOLD)
            .await
        {
            let artist = if recording.artist_credit.is_empty() {
                channel.to_string()
            } else {
                recording.artist_credit.clone()
            };
            let resolved_title = if recording.title.is_empty() {
                title.clone()
            } else {
                recording.title.clone()
            };
            let album = best_release(&recording.releases)
                .map(|r| r.title.clone())
                .filter(|t| !t.is_empty());
            return PathParts {
                artist,
                title: resolved_title,
                album,
            };
        }

        PathParts {
            artist: channel.to_string(),
            title,
            album: None,
        }
    }

    /// Run one search strategy and return the best-scoring record if it
    /// clears the threshold. Lookup errors are logged and treated as no
    /// match.
    async fn best_acceptable(
        &self,
        query: &str,
        limit: u32,
        artist: &str,
        title: &str,
        threshold: f64,
    ) -> Option<Recording> {
        let recordings = match self.lookup.search_recordings(query, limit).await {
            Ok(recordings) => recordings,
            Err(e) => {
                warn!("metadata lookup failed: {e}");
                return None;
            }
        };

        // Ties keep the first record; the service orders by relevance.
        let mut best: Option<(f64, Recording)> = None;
        for recording in recordings {
            let score = score_match(&recording, artist, title);
            match &best {
                Some((best_score, _)) if *best_score >= score => {}
                _ => best = Some((score, recording)),
            }
        }

        let (score, recording) = best?;
        if score >= threshold {
            debug!(score, title = %recording.title, "accepted metadata match");
            Some(recording)
        } else {
            None
        }
    }
}

/// Build tag metadata from an accepted record, falling back to the inputs
/// for fields the record does not carry.
fn metadata_from(recording: &Recording, title: &str, artist: &str) -> TrackMetadata {
    let best = best_release(&recording.releases);
    TrackMetadata {
        title: if recording.title.is_empty() {
            title.to_string()
        } else {
            recording.title.clone()
        },
        artist: if recording.artist_credit.is_empty() {
            artist.to_string()
        } else {
            recording.artist_credit.clone()
        },
        album: best.map(|r| r.title.clone()).unwrap_or_default(),
        year: best
            .and_then(|r| r.date.as_deref())
            .map(year_from_date)
            .unwrap_or_default(),
        genre: recording.tags.first().cloned().unwrap_or_default(),
    }
}

/// Confidence in `[0, 1]` that a record matches the target artist/title.
///
/// Title and artist each contribute half the score: full weight on an exact
/// case-insensitive match, otherwise proportional word overlap. Records
/// carrying release or ISRC data get a small bonus.
pub fn score_match(recording: &Recording, artist: &str, title: &str) -> f64 {
    let rec_title = recording.title.to_lowercase();
    let rec_artist = recording.artist_credit.to_lowercase();
    let artist = artist.to_lowercase();
    let title = title.to_lowercase();

    let mut score = 0.0;
    score += component_score(&title, &rec_title);
    score += component_score(&artist, &rec_artist);

    if !recording.releases.is_empty() {
        score += 0.05;
    }
    if !recording.isrcs.is_empty() {
        score += 0.05;
    }

    score.min(1.0)
}

fn component_score(target: &str, candidate: &str) -> f64 {
    if target == candidate {
        return 0.5;
    }
    let target_words: HashSet<&str> = target.split_whitespace().collect();
    let candidate_words: HashSet<&str> = candidate.split_whitespace().collect();
    let common = target_words.intersection(&candidate_words).count();
    if common == 0 {
        return 0.0;
    }
    let max_len = target_words.len().max(candidate_words.len());
    0.5 * common as f64 / max_len as f64
}

/// Pick the most useful release from a record's release list.
///
/// Albums over EPs/singles over compilations, then full-precision dates and
/// available cover art. Ties keep the first release encountered.
pub fn best_release(releases: &[Release]) -> Option<&Release> {
    let mut best: Option<(i32, &Release)> = None;
    for release in releases {
        let mut score = 0;
        match release.release_group_type.as_deref() {
            Some("Album") => score += 2,
            Some("EP") | Some("Single") => score += 1,
            Some("Compilation") => score -= 1,
            _ => {}
        }
        if release
            .date
            .as_deref()
            .map(|d| d.matches('-').count() == 2)
            .unwrap_or(false)
        {
            score += 1;
        }
        if release.cover_art_front {
            score += 1;
        }
        match best {
            Some((best_score, _)) if best_score >= score => {}
            _ => best = Some((score, release)),
        }
    }
    best.map(|(_, release)| release)
}
