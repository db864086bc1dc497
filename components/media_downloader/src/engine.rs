use async_trait::async_trait;

use crate::progress::ProgressSink;
use crate::request::EngineConfig;
use crate::types::{DownloadError, Extraction};

/// The external engine that resolves, downloads and transcodes media.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Check that the engine and its dependencies can be found
    async fn check_available(&self) -> Result<(), DownloadError>;

    /// Resolve `url` into one item or an ordered collection and download
    /// everything per `config`, reporting progress to `sink`.
    ///
    /// Individual collection entries may fail without failing the run; they
    /// come back as `None` entries.
    async fn extract(
        &self,
        url: &str,
        config: &EngineConfig,
        sink: &dyn ProgressSink,
    ) -> Result<Extraction, DownloadError>;
}

#[cfg(any(test, feature = "stub"))]
pub mod stub {
    use super::*;
    use crate::progress::ProgressEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    pub enum StubBehaviour {
        Return(Extraction),
        Fail(String),
        Panic(String),
    }

    /// Scripted stand-in for yt-dlp.
    pub struct ExtractorStub {
        events: Vec<ProgressEvent>,
        behaviour: StubBehaviour,
        available: bool,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl ExtractorStub {
        pub fn new(behaviour: StubBehaviour) -> Self {
            Self {
                events: Vec::new(),
                behaviour,
                available: true,
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn returning(extraction: Extraction) -> Self {
            Self::new(StubBehaviour::Return(extraction))
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self::new(StubBehaviour::Fail(message.into()))
        }

        pub fn with_events(mut self, events: Vec<ProgressEvent>) -> Self {
            self.events = events;
            self
        }

        pub fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        /// Hold `extract` until the gate is notified
        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Extractor for ExtractorStub {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn check_available(&self) -> Result<(), DownloadError> {
            if self.available {
                Ok(())
            } else {
                Err(DownloadError::DependencyNotFound("stub".to_string()))
            }
        }

        async fn extract(
            &self,
            _url: &str,
            _config: &EngineConfig,
            sink: &dyn ProgressSink,
        ) -> Result<Extraction, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            for event in &self.events {
                sink.on_event(event.clone());
            }
            match &self.behaviour {
                StubBehaviour::Return(extraction) => Ok(extraction.clone()),
                StubBehaviour::Fail(message) => Err(DownloadError::EngineFailed(message.clone())),
                StubBehaviour::Panic(message) => panic!("{}", message),
            }
        }
    }
}
