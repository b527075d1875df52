//! MusicBrainz API client.
//!
//! MusicBrainz requires:
//! - User-Agent header with application name/version and contact info
//! - Rate limiting: 1 request per second

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::traits::RecordingLookup;
use super::types::{LookupError, Recording, Release};

/// MusicBrainz API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzConfig {
    /// User-Agent string (required by MusicBrainz).
    /// Format: "AppName/Version ( contact@example.com )"
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Rate limit delay in milliseconds (default: 1100 for 1 req/sec).
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
    /// Base URL (default: https://musicbrainz.org/ws/2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_user_agent() -> String {
    format!(
        "Tracktor/{} ( https://github.com/lelloman/tracktor )",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_rate_limit() -> u64 {
    1100
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            rate_limit_ms: default_rate_limit(),
            base_url: None,
        }
    }
}

/// MusicBrainz API client.
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
    last_request: Arc<Mutex<Option<Instant>>>,
    rate_limit: Duration,
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client.
    pub fn new(config: MusicBrainzConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://musicbrainz.org/ws/2".to_string());

        Ok(Self {
            client,
            base_url,
            last_request: Arc::new(Mutex::new(None)),
            rate_limit: Duration::from_millis(config.rate_limit_ms),
        })
    }

    /// Wait for rate limit if needed.
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.rate_limit {
                let wait_time = self.rate_limit - elapsed;
                debug!("MusicBrainz rate limit: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[async_trait]
impl RecordingLookup for MusicBrainzClient {
    fn name(&self) -> &str {
        "musicbrainz"
    }

    async fn search_recordings(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Recording>, LookupError> {
        self.wait_for_rate_limit().await;

        let url = format!("{}/recording", self.base_url);
        let limit = limit.min(100); // MusicBrainz max is 100

        debug!("MusicBrainz search: query='{}', limit={}", query, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("fmt", "json"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == 429 {
            warn!("MusicBrainz rate limit exceeded");
            return Err(LookupError::RateLimitExceeded);
        }
        if status == 404 {
            return Err(LookupError::NotFound(query.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let search_result: MbSearchResponse = response.json().await.map_err(|e| {
            LookupError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        let recordings = search_result
            .recordings
            .into_iter()
            .map(|r| r.into())
            .collect();

        Ok(recordings)
    }
}

// ============================================================================
// MusicBrainz API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MbSearchResponse {
    #[serde(default)]
    recordings: Vec<MbRecording>,
}

#[derive(Debug, Deserialize)]
struct MbRecording {
    #[serde(default)]
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    releases: Vec<MbRelease>,
    #[serde(default)]
    tags: Vec<MbTag>,
    #[serde(default)]
    isrcs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    #[serde(default)]
    name: Option<String>,
    artist: MbArtist,
    #[serde(default)]
    joinphrase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct MbRelease {
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "release-group", default)]
    release_group: Option<MbReleaseGroup>,
    #[serde(rename = "cover-art-archive", default)]
    cover_art_archive: Option<MbCoverArtArchive>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseGroup {
    #[serde(rename = "primary-type", default)]
    primary_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbCoverArtArchive {
    #[serde(default)]
    front: bool,
}

#[derive(Debug, Deserialize)]
struct MbTag {
    #[serde(default)]
    name: String,
}

fn join_artist_credit(credits: &[MbArtistCredit]) -> String {
    credits
        .iter()
        .map(|ac| {
            let name = ac.name.clone().unwrap_or_else(|| ac.artist.name.clone());
            let join = ac.joinphrase.clone().unwrap_or_default();
            format!("{}{}", name, join)
        })
        .collect::<String>()
}

impl From<MbRecording> for Recording {
    fn from(mb: MbRecording) -> Self {
        let artist_credit = join_artist_credit(&mb.artist_credit);

        let releases = mb
            .releases
            .into_iter()
            .map(|r| Release {
                title: r.title,
                date: r.date,
                release_group_type: r.release_group.and_then(|rg| rg.primary_type),
                cover_art_front: r.cover_art_archive.map(|caa| caa.front).unwrap_or(false),
            })
            .collect();

        Recording {
            title: mb.title,
            artist_credit,
            releases,
            tags: mb.tags.into_iter().map(|t| t.name).collect(),
            isrcs: mb.isrcs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_credit_parsing() {
        let mb_recording = MbRecording {
            title: "Test Track".to_string(),
            artist_credit: vec![
                MbArtistCredit {
                    name: Some("Artist 1".to_string()),
                    artist: MbArtist {
                        name: "Artist 1".to_string(),
                    },
                    joinphrase: Some(" & ".to_string()),
                },
                MbArtistCredit {
                    name: Some("Artist 2".to_string()),
                    artist: MbArtist {
                        name: "Artist 2".to_string(),
                    },
                    joinphrase: None,
                },
            ],
            releases: vec![],
            tags: vec![],
            isrcs: vec![],
        };

        let recording: Recording = mb_recording.into();
        assert_eq!(recording.artist_credit, "Artist 1 & Artist 2");
    }

    #[test]
    fn test_recording_conversion_carries_releases_and_tags() {
        let json = r#"{
            "title": "Test Track",
            "artist-credit": [{"artist": {"name": "Some Artist"}}],
            "releases": [
                {
                    "title": "Some Album",
                    "date": "2011-05-09",
                    "release-group": {"primary-type": "Album"},
                    "cover-art-archive": {"front": true}
                }
            ],
            "tags": [{"name": "rock"}, {"name": "indie"}],
            "isrcs": ["USUM71100001"]
        }"#;

        let mb: MbRecording = serde_json::from_str(json).unwrap();
        let recording: Recording = mb.into();

        assert_eq!(recording.title, "Test Track");
        assert_eq!(recording.artist_credit, "Some Artist");
        assert_eq!(recording.releases.len(), 1);
        assert_eq!(recording.releases[0].title, "Some Album");
        assert_eq!(
            recording.releases[0].release_group_type.as_deref(),
            Some("Album")
        );
        assert!(recording.releases[0].cover_art_front);
        assert_eq!(recording.tags, vec!["rock", "indie"]);
        assert_eq!(recording.isrcs, vec!["USUM71100001"]);
    }

    #[test]
    fn test_search_response_defaults_to_empty() {
        let response: MbSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.recordings.is_empty());
    }
}
