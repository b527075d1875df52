//! yt-dlp backed media extractor.
//!
//! Shells out to the yt-dlp binary: `ytsearchN:` with JSON dumps for
//! catalog search, `--dump-single-json` for per-track info, and
//! `-x --audio-format` for fetch-plus-transcode. Progress is parsed from
//! stdout lines (`--newline`), failures are classified from stderr.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cancel::CancelToken;

use super::config::YtDlpConfig;
use super::traits::MediaExtractor;
use super::types::{
    ExtractorError, ExtractorEvent, PostProcessStage, SearchCandidate, TrackInfo,
};

static DOWNLOAD_PROGRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").expect("valid pattern"));
static DOWNLOAD_SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bat\s+(\S+)").expect("valid pattern"));
static DOWNLOAD_ETA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bETA\s+(\S+)").expect("valid pattern"));

/// Media extractor backed by the yt-dlp binary.
pub struct YtDlpExtractor {
    config: YtDlpConfig,
}

impl YtDlpExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(YtDlpConfig::default())
    }

    fn watch_url(video_id: &str) -> String {
        format!("https://youtube.com/watch?v={video_id}")
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(proxy) = &self.config.proxy {
            args.extend(["--proxy".to_string(), proxy.clone()]);
        }
        args
    }

    fn build_search_args(&self, query: &str, limit: u32) -> Vec<String> {
        let mut args = vec![
            format!("ytsearch{limit}:{query}"),
            "--dump-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-download".to_string(),
        ];
        args.extend(self.common_args());
        args
    }

    fn build_info_args(&self, video_id: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-download".to_string(),
            "--no-playlist".to_string(),
        ];
        args.extend(self.common_args());
        args.push(Self::watch_url(video_id));
        args
    }

    fn build_fetch_args(&self, video_id: &str, output_path: &Path) -> Vec<String> {
        // yt-dlp picks the real extension during post-processing, so it gets
        // the template `<stem>.%(ext)s` rather than the final path.
        let template = format!("{}.%(ext)s", output_path.with_extension("").display());

        let mut args = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "-o".to_string(),
            template,
        ];
        if self.config.embed_thumbnail {
            args.push("--embed-thumbnail".to_string());
        }
        if let Some(ffmpeg) = &self.config.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                ffmpeg.to_string_lossy().to_string(),
            ]);
        }
        args.extend(self.common_args());
        args.push(Self::watch_url(video_id));
        args
    }

    fn spawn(&self, args: &[String]) -> Result<tokio::process::Child, ExtractorError> {
        debug!(binary = %self.config.binary.display(), ?args, "spawning yt-dlp");
        Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::BackendNotFound {
                        path: self.config.binary.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })
    }

    /// Runs yt-dlp to completion and captures its output.
    async fn run_capture(&self, args: &[String]) -> Result<std::process::Output, ExtractorError> {
        let child = self.spawn(args)?;
        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            ExtractorError::Failed(format!(
                "yt-dlp timed out after {}s",
                self.config.timeout_secs
            ))
        })??;
        Ok(output)
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchCandidate>, ExtractorError> {
        let args = self.build_search_args(query, limit);
        let output = self.run_capture(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut candidates = Vec::new();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<YtSearchEntry>(line) {
                Ok(entry) => candidates.push(entry.into()),
                Err(e) => warn!("skipping unparseable search entry: {e}"),
            }
        }
        debug!(query, count = candidates.len(), "search finished");
        Ok(candidates)
    }

    async fn fetch_info(&self, video_id: &str) -> Result<TrackInfo, ExtractorError> {
        let args = self.build_info_args(video_id);
        let output = self.run_capture(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info: YtTrackInfo = serde_json::from_str(stdout.trim())
            .map_err(|e| ExtractorError::Parse(format!("info JSON: {e}")))?;
        Ok(info.into())
    }

    async fn fetch_audio(
        &self,
        video_id: &str,
        output_path: &Path,
        events_tx: mpsc::Sender<ExtractorEvent>,
        cancel: &CancelToken,
    ) -> Result<(), ExtractorError> {
        let args = self.build_fetch_args(video_id, output_path);
        let mut child = self.spawn(&args)?;

        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().expect("stderr is piped");

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = String::new();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("yt-dlp stderr: {line}");
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        });

        let mut lines = BufReader::new(stdout).lines();
        let read_result = timeout(Duration::from_secs(self.config.timeout_secs), async {
            loop {
                tokio::select! {
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if cancel.is_cancelled() {
                                return Err(ExtractorError::Cancelled);
                            }
                            if let Some(event) = parse_progress_line(&line) {
                                let _ = events_tx.send(event).await;
                            }
                        }
                        _ => return Ok(()),
                    },
                    _ = tokio::time::sleep(Duration::from_millis(250)) => {
                        if cancel.is_cancelled() {
                            return Err(ExtractorError::Cancelled);
                        }
                    }
                }
            }
        })
        .await;

        let read_result = match read_result {
            Ok(inner) => inner,
            Err(_) => {
                let _ = child.kill().await;
                let _ = stderr_task.await;
                return Err(ExtractorError::Failed(format!(
                    "yt-dlp timed out after {}s",
                    self.config.timeout_secs
                )));
            }
        };

        if let Err(e) = read_result {
            let _ = child.kill().await;
            let _ = stderr_task.await;
            return Err(e);
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(classify_stderr(&stderr_text));
        }
        Ok(())
    }
}

/// Maps a yt-dlp stderr dump onto the error taxonomy.
fn classify_stderr(stderr: &str) -> ExtractorError {
    if stderr.contains("HTTP Error 403") || stderr.contains("403 Forbidden") {
        return ExtractorError::Blocked;
    }
    if stderr.contains("Video unavailable")
        || stderr.contains("Private video")
        || stderr.contains("has been removed")
    {
        return ExtractorError::Unavailable;
    }
    if stderr.contains("Sign in") {
        return ExtractorError::AuthRequired;
    }
    let reason = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string();
    ExtractorError::Failed(reason)
}

/// Parses one stdout line into a progress event, if it carries one.
fn parse_progress_line(line: &str) -> Option<ExtractorEvent> {
    if line.starts_with("[ExtractAudio]") {
        return Some(ExtractorEvent::PostProcessing {
            stage: PostProcessStage::Convert,
            finished: false,
        });
    }
    if line.starts_with("[Metadata]") {
        return Some(ExtractorEvent::PostProcessing {
            stage: PostProcessStage::EmbedMetadata,
            finished: false,
        });
    }
    if line.starts_with("[EmbedThumbnail]") {
        return Some(ExtractorEvent::PostProcessing {
            stage: PostProcessStage::EmbedThumbnail,
            finished: false,
        });
    }
    if let Some(caps) = DOWNLOAD_PROGRESS.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        if percent >= 100.0 {
            return Some(ExtractorEvent::DownloadFinished);
        }
        let speed = DOWNLOAD_SPEED
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        let eta = DOWNLOAD_ETA
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        return Some(ExtractorEvent::Downloading {
            fraction: (percent / 100.0).clamp(0.0, 1.0),
            speed,
            eta,
        });
    }
    None
}

// ============================================================================
// yt-dlp JSON payloads (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct YtSearchEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    dislike_count: Option<u64>,
    #[serde(default)]
    channel_is_verified: Option<bool>,
}

impl From<YtSearchEntry> for SearchCandidate {
    fn from(entry: YtSearchEntry) -> Self {
        SearchCandidate {
            id: entry.id,
            title: entry.title,
            channel: entry.channel.or(entry.uploader).unwrap_or_default(),
            duration_secs: entry.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
            view_count: entry.view_count,
            like_count: entry.like_count,
            dislike_count: entry.dislike_count,
            channel_verified: entry.channel_is_verified.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YtTrackInfo {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl From<YtTrackInfo> for TrackInfo {
    fn from(info: YtTrackInfo) -> Self {
        TrackInfo {
            id: info.id,
            title: info.title,
            channel: info.channel.or(info.uploader).unwrap_or_default(),
            upload_date: info.upload_date.unwrap_or_default(),
            album: info.album,
            genre: info.genre,
            duration_secs: info.duration.map(|d| d.max(0.0) as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_blocked() {
        let err = classify_stderr("ERROR: unable to download: HTTP Error 403: Forbidden");
        assert!(matches!(err, ExtractorError::Blocked));
    }

    #[test]
    fn test_classify_unavailable() {
        let err = classify_stderr("ERROR: Video unavailable");
        assert!(matches!(err, ExtractorError::Unavailable));
        let err = classify_stderr("ERROR: Private video");
        assert!(matches!(err, ExtractorError::Unavailable));
    }

    #[test]
    fn test_classify_auth_required() {
        let err = classify_stderr("ERROR: Sign in to confirm your age");
        assert!(matches!(err, ExtractorError::AuthRequired));
    }

    #[test]
    fn test_classify_unknown_keeps_last_line() {
        let err = classify_stderr("WARNING: something\nERROR: weird failure\n");
        match err {
            ExtractorError::Failed(reason) => assert_eq!(reason, "ERROR: weird failure"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_download_progress() {
        let event =
            parse_progress_line("[download]  23.4% of 3.45MiB at 512.00KiB/s ETA 00:05").unwrap();
        match event {
            ExtractorEvent::Downloading {
                fraction,
                speed,
                eta,
            } => {
                assert!((fraction - 0.234).abs() < 1e-4);
                assert_eq!(speed.as_deref(), Some("512.00KiB/s"));
                assert_eq!(eta.as_deref(), Some("00:05"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_download_complete() {
        let event = parse_progress_line("[download] 100% of 3.45MiB in 00:12").unwrap();
        assert_eq!(event, ExtractorEvent::DownloadFinished);
    }

    #[test]
    fn test_parse_postprocess_stages() {
        assert_eq!(
            parse_progress_line("[ExtractAudio] Destination: /tmp/x.mp3"),
            Some(ExtractorEvent::PostProcessing {
                stage: PostProcessStage::Convert,
                finished: false
            })
        );
        assert_eq!(
            parse_progress_line("[EmbedThumbnail] ffmpeg: Adding thumbnail"),
            Some(ExtractorEvent::PostProcessing {
                stage: PostProcessStage::EmbedThumbnail,
                finished: false
            })
        );
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        assert_eq!(parse_progress_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn test_search_entry_conversion_falls_back_to_uploader() {
        let json = r#"{"id": "x1", "title": "T", "uploader": "Someone", "duration": 213.4}"#;
        let entry: YtSearchEntry = serde_json::from_str(json).unwrap();
        let candidate: SearchCandidate = entry.into();
        assert_eq!(candidate.channel, "Someone");
        assert_eq!(candidate.duration_secs, 213);
    }

    #[test]
    fn test_fetch_args_use_extension_template() {
        let extractor = YtDlpExtractor::with_defaults();
        let args = extractor.build_fetch_args("abc", Path::new("/music/Artist/Song.mp3"));
        assert!(args.contains(&"/music/Artist/Song.%(ext)s".to_string()));
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"mp3".to_string()));
        assert!(args.contains(&"https://youtube.com/watch?v=abc".to_string()));
    }

    #[test]
    fn test_search_args_embed_query_and_limit() {
        let extractor = YtDlpExtractor::with_defaults();
        let args = extractor.build_search_args("test song", 10);
        assert_eq!(args[0], "ytsearch10:test song");
        assert!(args.contains(&"--dump-json".to_string()));
    }
}
