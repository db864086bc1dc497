// components/media_downloader/src/lib.rs
//! Fetch a playlist or a single video through an external extraction engine.
//!
//! A run goes through three steps: a [`DownloadRequest`] is validated and
//! turned into an [`EngineConfig`], an [`Extractor`] downloads everything
//! while reporting [`ProgressEvent`]s to a [`ProgressSink`], and [`execute`]
//! folds the result into a single [`DownloadOutcome`].

mod engine;
mod organization;
mod outcome;
mod progress;
mod request;
mod types;
mod ytdlp;

pub use engine::Extractor;
pub use organization::OutputLayout;
pub use outcome::{execute, rule, DownloadOutcome};
pub use progress::{ConsoleReporter, NullSink, ProgressEvent, ProgressPhase, ProgressSink, PLACEHOLDER};
pub use request::{AudioExtraction, DownloadRequest, EngineConfig, FormatChoice, QualityTier};
pub use types::{DownloadError, Extraction, ItemSummary, ValidationError};
pub use ytdlp::YtDlp;

#[cfg(any(test, feature = "stub"))]
pub use engine::stub;
