//! Download orchestration.
//!
//! The orchestrator drives one download task through the pipeline:
//! - **FetchingInfo**: remote metadata for the reference, no media bytes
//! - **Resolving**: canonical output path from best-effort metadata
//! - **Downloading**: fetch + transcode straight to the resolved path
//! - **Tagging**: apply resolved metadata (non-fatal on failure)
//! - **CleaningUp**: sweep artifacts; on failure, purge partial files
//!
//! Terminal states are final; a retry is a new task.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::DownloadOrchestrator;
pub use types::{DownloadError, DownloadTask, ProgressLevel, ProgressUpdate};
