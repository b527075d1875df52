//! Search-result ranking heuristic.
//!
//! Pure scoring of a candidate against the user's query. The constants are
//! load-bearing: they encode the preference order official-audio > lyric
//! video > radio edit > other official content, and push down live/remix/
//! cover variants.

use serde::Serialize;

use crate::extractor::SearchCandidate;
use crate::filter::ContentFilter;

/// Score assigned to candidates whose title or channel trips the profanity
/// filter. Low enough to rank below any legitimate candidate.
pub const PROFANITY_SENTINEL: f64 = -100.0;

/// Version keywords that usually mean "not the studio track". Each match
/// costs the candidate 8 points; penalties accumulate.
const UNDESIRED_VERSIONS: &[&str] = &[
    "live",
    "cover",
    "remix",
    "instrumental",
    "karaoke",
    "extended",
    "concert",
    "performance",
    "rehearsal",
    "demo",
    "acoustic",
    "remake",
    "remaster",
    "mix",
    "mashup",
];

/// A search candidate with its score attached.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub candidate: SearchCandidate,
    pub score: f64,
}

/// Scores one candidate against a query. Deterministic, no I/O.
pub fn score(candidate: &SearchCandidate, query: &str, filter: &ContentFilter) -> f64 {
    let title = candidate.title.to_lowercase();
    let channel = candidate.channel.to_lowercase();
    let query = query.to_lowercase();

    if filter.enabled()
        && (filter.contains_profanity(&title) || filter.contains_profanity(&channel))
    {
        return PROFANITY_SENTINEL;
    }

    let mut score = 0.0;

    if title.contains(&query) {
        score += 10.0;
    }

    // Typical song lengths first, mixes and compilations last.
    let duration = candidate.duration_secs;
    if (180..=360).contains(&duration) {
        score += 5.0;
    } else if (120..=480).contains(&duration) {
        score += 3.0;
    } else if duration > 480 {
        score -= 5.0;
    }

    if title.contains("official audio") {
        score += 25.0;
    } else if title.contains("audio") {
        score += 15.0;
    }

    if title.contains("lyric video") || title.contains("lyrics") {
        score += 20.0;
    }

    if title.contains("radio edit") || title.contains("radio version") {
        score += 12.0;
    }

    if title.contains("official") {
        score += 10.0;
    }

    if title.contains("official video") || title.contains("music video") {
        score -= 5.0;
    }

    for term in UNDESIRED_VERSIONS {
        if title.contains(term) {
            score -= 8.0;
        }
    }

    if candidate.channel_verified {
        score += 5.0;
    }

    match candidate.view_count {
        Some(views) if views > 0 => {
            score += (views as f64 / 1_000_000.0).min(5.0);
        }
        _ => {}
    }

    if let (Some(likes), Some(dislikes)) = (candidate.like_count, candidate.dislike_count) {
        let total = likes + dislikes;
        if total > 0 {
            score += 3.0 * likes as f64 / total as f64;
        }
    }

    score
}
