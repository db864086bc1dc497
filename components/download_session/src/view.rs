use media_downloader::DownloadOutcome;

use crate::StartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

/// A modal message waiting to be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    fn new(kind: DialogKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Display state of the windowed shell. Only ever touched on the UI thread.
#[derive(Debug, Default)]
pub struct SessionView {
    log: Vec<String>,
    busy: bool,
    dialog: Option<Dialog>,
}

impl SessionView {
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Drives the indeterminate progress indicator
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn start_enabled(&self) -> bool {
        !self.busy
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialog = None;
    }

    pub(crate) fn begin_run(&mut self) {
        self.log.clear();
        self.busy = true;
    }

    pub(crate) fn append(&mut self, line: String) {
        self.log.push(line);
    }

    pub(crate) fn finish(&mut self, outcome: &DownloadOutcome) {
        self.busy = false;
        self.dialog = Some(if outcome.succeeded {
            Dialog::new(DialogKind::Info, "Success", "Download completed!")
        } else {
            Dialog::new(
                DialogKind::Error,
                "Error",
                format!(
                    "Download failed: {}",
                    outcome.error_message.as_deref().unwrap_or("Unknown error")
                ),
            )
        });
    }

    /// Show why a start request was turned down
    pub fn reject(&mut self, error: &StartError) {
        self.dialog = Some(match error {
            StartError::AlreadyRunning => Dialog::new(
                DialogKind::Warning,
                "Download in Progress",
                "A download is already in progress!",
            ),
            StartError::Invalid(e) => Dialog::new(DialogKind::Error, "Error", e.to_string()),
        });
    }
}
