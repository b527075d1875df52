pub mod cancel;
pub mod config;
pub mod engine;
pub mod extractor;
pub mod filter;
pub mod metadata;
pub mod normalizer;
pub mod orchestrator;
pub mod placer;
pub mod searcher;
pub mod tagger;
pub mod testing;

pub use cancel::CancelToken;
pub use engine::Engine;
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DownloadsConfig,
    FilterConfig,
};
pub use extractor::{
    ExtractorError, ExtractorEvent, MediaExtractor, SearchCandidate, TrackInfo, YtDlpConfig,
    YtDlpExtractor,
};
pub use filter::ContentFilter;
pub use metadata::{
    MetadataResolver, MusicBrainzClient, MusicBrainzConfig, RecordingLookup, TrackMetadata,
};
pub use normalizer::normalize_title;
pub use orchestrator::{
    DownloadError, DownloadOrchestrator, OrchestratorConfig, ProgressLevel, ProgressUpdate,
};
pub use placer::PathResolver;
pub use searcher::{ScoredCandidate, TrackSearcher};
pub use tagger::{AppliedTags, TagWriter};
