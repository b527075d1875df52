//! Track search: catalog query plus ranking.
//!
//! `TrackSearcher` asks the extraction backend for raw candidates, scores
//! each against the query and returns them best-first, capped at
//! [`MAX_RESULTS`]. Selection stays with the caller.

mod ranker;

pub use ranker::{score, ScoredCandidate, PROFANITY_SENTINEL};

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::extractor::{ExtractorError, MediaExtractor};
use crate::filter::ContentFilter;

/// Cap on the number of scored candidates returned to the caller.
pub const MAX_RESULTS: usize = 10;

/// Searches the media catalog and ranks the results.
pub struct TrackSearcher {
    extractor: Arc<dyn MediaExtractor>,
    filter: ContentFilter,
    limit: u32,
}

impl TrackSearcher {
    pub fn new(extractor: Arc<dyn MediaExtractor>, filter: ContentFilter, limit: u32) -> Self {
        Self {
            extractor,
            filter,
            limit,
        }
    }

    /// Search for tracks matching the query.
    ///
    /// Results are sorted by score descending; the sort is stable, so ties
    /// keep the extraction service's order.
    pub async fn search(&self, query: &str) -> Result<Vec<ScoredCandidate>, ExtractorError> {
        let raw = self.extractor.search(query, self.limit).await?;
        debug!(query, candidates = raw.len(), "scoring search results");

        let mut scored: Vec<ScoredCandidate> = raw
            .into_iter()
            .map(|candidate| ScoredCandidate {
                score: ranker::score(&candidate, query, &self.filter),
                candidate,
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(MAX_RESULTS);
        Ok(scored)
    }
}
