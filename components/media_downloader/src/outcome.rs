use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info};

use crate::engine::Extractor;
use crate::progress::ProgressSink;
use crate::request::EngineConfig;
use crate::types::Extraction;

/// Width of the `=` rules around banners.
pub const RULE_WIDTH: usize = 60;

const UNKNOWN_PLAYLIST: &str = "Unknown Playlist";

/// Result of one run. Created exactly once, after the engine returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub succeeded: bool,
    pub item_title: Option<String>,
    pub item_count: Option<usize>,
    pub error_message: Option<String>,
}

impl DownloadOutcome {
    pub fn from_extraction(extraction: &Extraction) -> Self {
        match extraction {
            Extraction::Collection { title, .. } => Self {
                succeeded: true,
                item_title: Some(
                    title
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_PLAYLIST.to_string()),
                ),
                item_count: extraction.item_count(),
                error_message: None,
            },
            Extraction::Single { title } => Self {
                succeeded: true,
                item_title: title.clone(),
                item_count: None,
                error_message: None,
            },
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            succeeded: false,
            item_title: None,
            item_count: None,
            error_message: Some(if message.is_empty() {
                "Unknown error".to_string()
            } else {
                message
            }),
        }
    }

    /// The lines between the banner rules
    pub fn summary_lines(&self) -> Vec<String> {
        if !self.succeeded {
            return vec![format!(
                "✗ Error occurred: {}",
                self.error_message.as_deref().unwrap_or("Unknown error")
            )];
        }

        match self.item_count {
            Some(count) => vec![
                format!(
                    "✓ Successfully downloaded playlist: {}",
                    self.item_title.as_deref().unwrap_or(UNKNOWN_PLAYLIST)
                ),
                format!("✓ Total videos: {}", count),
            ],
            None => vec!["✓ Successfully downloaded single video".to_string()],
        }
    }

    /// Summary framed by rules, ready to print
    pub fn banner(&self) -> String {
        let rule = rule();
        let mut banner = format!("\n{}\n", rule);
        for line in self.summary_lines() {
            banner.push_str(&line);
            banner.push('\n');
        }
        banner.push_str(&rule);
        banner.push('\n');
        banner
    }
}

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Run the engine and turn whatever happens into a [`DownloadOutcome`].
///
/// Engine errors and panics are both caught here; nothing escapes to the
/// caller.
pub async fn execute(
    extractor: &dyn Extractor,
    url: &str,
    config: &EngineConfig,
    sink: &dyn ProgressSink,
) -> DownloadOutcome {
    info!("Starting {} run for {}", extractor.name(), url);

    let run = async {
        extractor.check_available().await?;
        extractor.extract(url, config, sink).await
    };

    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(Ok(extraction)) => {
            let outcome = DownloadOutcome::from_extraction(&extraction);
            info!(
                "Run finished: {:?} ({:?} items)",
                outcome.item_title, outcome.item_count
            );
            outcome
        }
        Ok(Err(e)) => {
            error!("Run failed: {}", e);
            DownloadOutcome::failure(e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("Engine panicked: {}", message);
            DownloadOutcome::failure(message)
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "engine panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{ExtractorStub, StubBehaviour};
    use crate::progress::{NullSink, ProgressEvent};
    use crate::request::DownloadRequest;
    use crate::types::ItemSummary;
    use tempfile::TempDir;

    fn item(id: &str) -> Option<ItemSummary> {
        Some(ItemSummary {
            id: id.to_string(),
            title: None,
        })
    }

    fn config(temp_dir: &TempDir) -> EngineConfig {
        DownloadRequest::new("https://example.com/list", temp_dir.path().join("test_x"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn collection_counts_only_successful_entries() {
        let temp_dir = TempDir::new().unwrap();
        let stub = ExtractorStub::returning(Extraction::Collection {
            title: Some("Road Trip".into()),
            entries: vec![item("a"), None, item("c"), item("d"), None],
        });

        let outcome = execute(&stub, "https://example.com/list", &config(&temp_dir), &NullSink).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.item_title.as_deref(), Some("Road Trip"));
        assert_eq!(outcome.item_count, Some(3));
        assert_eq!(outcome.error_message, None);
    }

    #[tokio::test]
    async fn untitled_collection_gets_fallback_title() {
        let temp_dir = TempDir::new().unwrap();
        let stub = ExtractorStub::returning(Extraction::Collection {
            title: None,
            entries: vec![None],
        });

        let outcome = execute(&stub, "u", &config(&temp_dir), &NullSink).await;

        assert_eq!(outcome.item_title.as_deref(), Some("Unknown Playlist"));
        assert_eq!(outcome.item_count, Some(0));
    }

    #[tokio::test]
    async fn single_item_has_no_count() {
        let temp_dir = TempDir::new().unwrap();
        let stub = ExtractorStub::returning(Extraction::Single {
            title: Some("Clip".into()),
        });

        let outcome = execute(&stub, "u", &config(&temp_dir), &NullSink).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.item_count, None);
        assert_eq!(
            outcome.summary_lines(),
            vec!["✓ Successfully downloaded single video".to_string()]
        );
    }

    #[tokio::test]
    async fn engine_error_becomes_failure() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        let stub = ExtractorStub::failing("ERROR: Unable to download webpage");

        let outcome = execute(&stub, "u", &config, &NullSink).await;

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("ERROR: Unable to download webpage")
        );
        assert!(config.output.root().is_dir());
    }

    #[tokio::test]
    async fn engine_panic_becomes_failure() {
        let temp_dir = TempDir::new().unwrap();
        let stub = ExtractorStub::new(StubBehaviour::Panic("boom".into()));

        let outcome = execute(&stub, "u", &config(&temp_dir), &NullSink).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn unavailable_engine_is_never_invoked() {
        let temp_dir = TempDir::new().unwrap();
        let stub = ExtractorStub::returning(Extraction::Single { title: None }).unavailable();

        let outcome = execute(&stub, "u", &config(&temp_dir), &NullSink).await;

        assert!(!outcome.succeeded);
        assert_eq!(stub.calls(), 0);
        assert!(outcome
            .error_message
            .unwrap()
            .contains("Required dependency not found"));
    }

    #[tokio::test]
    async fn events_reach_the_sink_in_order() {
        struct Recorder(parking_lot::Mutex<Vec<String>>);
        impl ProgressSink for Recorder {
            fn on_event(&self, event: ProgressEvent) {
                self.0.lock().push(event.filename);
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let stub = ExtractorStub::returning(Extraction::Single { title: None }).with_events(vec![
            ProgressEvent::downloading("one", None, None),
            ProgressEvent::finished("one"),
            ProgressEvent::downloading("two", None, None),
        ]);
        let recorder = Recorder(parking_lot::Mutex::new(Vec::new()));

        execute(&stub, "u", &config(&temp_dir), &recorder).await;

        assert_eq!(*recorder.0.lock(), vec!["one", "one", "two"]);
    }

    #[test]
    fn banners_are_delimited() {
        let success = DownloadOutcome {
            succeeded: true,
            item_title: Some("Mix".into()),
            item_count: Some(4),
            error_message: None,
        };
        let banner = success.banner();
        let rule = "=".repeat(60);

        assert!(banner.starts_with(&format!("\n{}\n", rule)));
        assert!(banner.ends_with(&format!("{}\n", rule)));
        assert!(banner.contains("✓ Successfully downloaded playlist: Mix\n"));
        assert!(banner.contains("✓ Total videos: 4\n"));

        let failure = DownloadOutcome::failure("network down").banner();
        assert!(failure.contains("✗ Error occurred: network down\n"));
    }

    #[test]
    fn empty_failure_message_is_replaced() {
        let outcome = DownloadOutcome::failure("");
        assert_eq!(outcome.error_message.as_deref(), Some("Unknown error"));
    }
}
