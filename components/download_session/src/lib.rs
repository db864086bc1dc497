//! Run coordination for the windowed shell.
//!
//! The UI thread owns a [`Session`] and a [`SessionView`]. Starting a run
//! spawns one worker task; the worker never touches the view. It posts
//! [`UiUpdate`]s into a mailbox and the UI thread applies them in
//! [`Session::pump`].

mod view;

use std::path::PathBuf;
use std::sync::Arc;

use media_downloader::{
    execute, DownloadOutcome, DownloadRequest, Extractor, FormatChoice, ProgressEvent,
    ProgressPhase, ProgressSink, ValidationError,
};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

pub use view::{Dialog, DialogKind, SessionView};

/// Asks the UI to redraw after a post; called from the worker.
pub type Wake = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("A download is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// What the form holds when Download is pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartForm {
    pub url: String,
    pub folder: PathBuf,
    pub choice: FormatChoice,
}

#[derive(Debug)]
pub enum UiUpdate {
    Log(String),
    Finished(DownloadOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    Idle,
    Running,
}

pub struct Session {
    runtime: Handle,
    extractor: Arc<dyn Extractor>,
    phase: Mutex<RunPhase>,
    mailbox: Mailbox,
    inbox: Mutex<UnboundedReceiver<UiUpdate>>,
}

impl Session {
    pub fn new(runtime: Handle, extractor: Arc<dyn Extractor>, wake: Wake) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            extractor,
            phase: Mutex::new(RunPhase::Idle),
            mailbox: Mailbox { tx, wake },
            inbox: Mutex::new(rx),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.phase.lock() != RunPhase::Idle
    }

    /// Validate the form and dispatch a worker for it.
    ///
    /// The phase is checked and claimed under one lock, so a second start
    /// while a run is active is rejected without spawning anything. Only
    /// the checks that need no disk access run here; the destination is
    /// created by the worker.
    pub fn start(&self, form: &StartForm, view: &mut SessionView) -> Result<(), StartError> {
        let request = DownloadRequest::new(form.url.trim(), &form.folder).with_choice(form.choice);

        let mut phase = self.phase.lock();
        if *phase != RunPhase::Idle {
            warn!("Start rejected: a run is already active");
            return Err(StartError::AlreadyRunning);
        }
        request.validate()?;
        *phase = RunPhase::Running;
        drop(phase);

        view.begin_run();

        let extractor = Arc::clone(&self.extractor);
        let mailbox = self.mailbox.clone();
        info!("Dispatching worker for {}", request.url());

        self.runtime.spawn(async move {
            let url = request.url().to_string();
            mailbox.log(format!("Starting download from: {}", url));
            mailbox.log(format!("Saving to: {}", request.destination.display()));
            mailbox.log(separator());

            let outcome = match request.build() {
                Ok(config) => {
                    let reporter = MailboxReporter {
                        mailbox: mailbox.clone(),
                    };
                    execute(extractor.as_ref(), &url, &config, &reporter).await
                }
                Err(e) => {
                    warn!("Destination unusable: {}", e);
                    DownloadOutcome::failure(e.to_string())
                }
            };

            if outcome.succeeded {
                mailbox.log(separator());
            }
            for line in outcome.summary_lines() {
                mailbox.log(line);
            }
            mailbox.post(UiUpdate::Finished(outcome));
        });

        Ok(())
    }

    /// Apply everything the worker posted. Call on the UI thread.
    ///
    /// Returns the outcome if the run finished during this pump.
    pub fn pump(&self, view: &mut SessionView) -> Option<DownloadOutcome> {
        let mut inbox = self.inbox.lock();
        let mut finished = None;
        while let Ok(update) = inbox.try_recv() {
            match update {
                UiUpdate::Log(line) => view.append(line),
                UiUpdate::Finished(outcome) => {
                    *self.phase.lock() = RunPhase::Idle;
                    view.finish(&outcome);
                    finished = Some(outcome);
                }
            }
        }
        finished
    }
}

fn separator() -> String {
    "-".repeat(60)
}

#[derive(Clone)]
struct Mailbox {
    tx: UnboundedSender<UiUpdate>,
    wake: Wake,
}

impl Mailbox {
    fn post(&self, update: UiUpdate) {
        // The window may already be gone
        if self.tx.send(update).is_ok() {
            (self.wake)();
        }
    }

    fn log(&self, line: impl Into<String>) {
        self.post(UiUpdate::Log(line.into()));
    }
}

/// Turns progress events into log lines posted to the UI thread.
struct MailboxReporter {
    mailbox: Mailbox,
}

impl ProgressSink for MailboxReporter {
    fn on_event(&self, event: ProgressEvent) {
        let name = event.display_name();
        let line = match event.phase {
            ProgressPhase::Downloading => event.status_line(&name),
            ProgressPhase::Finished => format!("✓ Finished: {}", name),
        };
        self.mailbox.log(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use media_downloader::stub::ExtractorStub;
    use media_downloader::{Extraction, ItemSummary};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    fn counting_wake() -> (Wake, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let wake: Wake = Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (wake, count)
    }

    fn form(temp_dir: &TempDir, url: &str) -> StartForm {
        StartForm {
            url: url.to_string(),
            folder: temp_dir.path().join("downloads"),
            choice: FormatChoice::P720,
        }
    }

    async fn pump_until_finished(session: &Session, view: &mut SessionView) -> DownloadOutcome {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(outcome) = session.pump(&mut *view) {
                    return outcome;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("run did not finish")
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let temp_dir = TempDir::new().unwrap();
        let gate = Arc::new(Notify::new());
        let stub = Arc::new(
            ExtractorStub::returning(Extraction::Collection {
                title: Some("Mix".into()),
                entries: vec![Some(ItemSummary {
                    id: "a".into(),
                    title: None,
                })],
            })
            .gated(Arc::clone(&gate)),
        );
        let (wake, _) = counting_wake();
        let session = Session::new(Handle::current(), stub.clone(), wake);
        let mut view = SessionView::default();
        let form = form(&temp_dir, "https://example.com/list");

        session.start(&form, &mut view).unwrap();
        let second = session.start(&form, &mut view);

        assert_matches!(second, Err(StartError::AlreadyRunning));
        assert!(session.is_running());
        assert!(!view.start_enabled());

        gate.notify_one();
        let outcome = pump_until_finished(&session, &mut view).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.item_count, Some(1));
        assert_eq!(stub.calls(), 1);
        assert!(!session.is_running());
        assert!(view.start_enabled());
        assert_eq!(view.dialog().unwrap().kind, DialogKind::Info);
    }

    #[tokio::test]
    async fn invalid_form_never_dispatches() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(ExtractorStub::returning(Extraction::Single { title: None }));
        let (wake, wakes) = counting_wake();
        let session = Session::new(Handle::current(), stub.clone(), wake);
        let mut view = SessionView::default();

        let result = session.start(&form(&temp_dir, "  "), &mut view);

        assert_matches!(result, Err(StartError::Invalid(ValidationError::EmptyUrl)));
        assert!(!session.is_running());
        assert!(view.start_enabled());

        tokio::task::yield_now().await;
        assert_eq!(stub.calls(), 0);
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn progress_and_failure_arrive_through_the_mailbox() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(ExtractorStub::failing("ERROR: offline").with_events(vec![
            ProgressEvent::downloading(
                "/tmp/dl/Mix/Song.webm",
                Some("12.0%".into()),
                Some("1.00MiB/s".into()),
            ),
            ProgressEvent::finished("/tmp/dl/Mix/Song.webm"),
        ]));
        let (wake, wakes) = counting_wake();
        let session = Session::new(Handle::current(), stub, wake);
        let mut view = SessionView::default();
        let form = form(&temp_dir, "https://example.com/list");

        session.start(&form, &mut view).unwrap();
        let outcome = pump_until_finished(&session, &mut view).await;

        assert!(!outcome.succeeded);
        assert!(form.folder.is_dir());
        assert!(wakes.load(Ordering::SeqCst) > 0);

        let log = view.log();
        assert_eq!(log[0], "Starting download from: https://example.com/list");
        assert!(log.contains(&"Downloading: Song.webm - 12.0% at 1.00MiB/s".to_string()));
        assert!(log.contains(&"✓ Finished: Song.webm".to_string()));
        assert_eq!(log.last().unwrap(), "✗ Error occurred: ERROR: offline");
        assert_eq!(view.dialog().unwrap().kind, DialogKind::Error);
    }

    #[tokio::test]
    async fn unusable_folder_fails_the_run_without_extracting() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("downloads");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let stub = Arc::new(ExtractorStub::returning(Extraction::Single { title: None }));
        let (wake, _) = counting_wake();
        let session = Session::new(Handle::current(), stub.clone(), wake);
        let mut view = SessionView::default();

        session
            .start(&form(&temp_dir, "https://example.com/v"), &mut view)
            .unwrap();
        let outcome = pump_until_finished(&session, &mut view).await;

        assert!(!outcome.succeeded);
        assert_eq!(stub.calls(), 0);
        assert!(!session.is_running());
        assert_eq!(view.dialog().unwrap().kind, DialogKind::Error);
    }

    #[tokio::test]
    async fn session_is_reusable_after_a_run() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(ExtractorStub::returning(Extraction::Single { title: None }));
        let (wake, _) = counting_wake();
        let session = Session::new(Handle::current(), stub.clone(), wake);
        let mut view = SessionView::default();
        let form = form(&temp_dir, "https://example.com/v");

        session.start(&form, &mut view).unwrap();
        pump_until_finished(&session, &mut view).await;
        session.start(&form, &mut view).unwrap();
        pump_until_finished(&session, &mut view).await;

        assert_eq!(stub.calls(), 2);
    }
}
