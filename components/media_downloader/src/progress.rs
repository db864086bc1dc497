use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;

/// Rendered in place of a percent or speed the engine did not report.
pub const PLACEHOLDER: &str = "N/A";

/// Marker that prefixes machine-readable progress lines on the engine's stdout.
pub const PROGRESS_MARKER: &str = "[progress]";

/// Progress template handed to yt-dlp. The filename goes last because it is
/// the only field that may contain the separator.
pub const PROGRESS_TEMPLATE: &str = "download:[progress]%(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress.filename)s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Downloading,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub filename: String,
    pub percent: Option<String>,
    pub speed: Option<String>,
}

impl ProgressEvent {
    pub fn downloading(
        filename: impl Into<String>,
        percent: Option<String>,
        speed: Option<String>,
    ) -> Self {
        Self {
            phase: ProgressPhase::Downloading,
            filename: filename.into(),
            percent,
            speed,
        }
    }

    pub fn finished(filename: impl Into<String>) -> Self {
        Self {
            phase: ProgressPhase::Finished,
            filename: filename.into(),
            percent: None,
            speed: None,
        }
    }

    /// Parse one line written with [`PROGRESS_TEMPLATE`].
    ///
    /// Returns `None` for anything that is not a progress line, and for
    /// statuses other than downloading/finished (yt-dlp also reports `error`).
    pub fn parse_template_line(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix(PROGRESS_MARKER)?;
        let mut fields = rest.splitn(4, '|');

        let status = fields.next()?.trim();
        let percent = reported(fields.next()?);
        let speed = reported(fields.next()?);
        let filename = reported(fields.next()?).unwrap_or_else(|| "unknown".to_string());

        match status {
            "downloading" => Some(Self::downloading(filename, percent, speed)),
            "finished" => Some(Self::finished(filename)),
            _ => None,
        }
    }

    /// Last path component of the reported filename
    pub fn display_name(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }

    /// `Downloading: {filename} - {percent} at {speed}`
    pub fn status_line(&self, filename: &str) -> String {
        format!(
            "Downloading: {} - {} at {}",
            filename,
            self.percent.as_deref().unwrap_or(PLACEHOLDER),
            self.speed.as_deref().unwrap_or(PLACEHOLDER)
        )
    }
}

fn reported(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() || field == "NA" {
        None
    } else {
        Some(field.to_string())
    }
}

/// Receives progress events from the engine.
///
/// Called from whatever context runs the engine, so implementations must not
/// assume they are on the display's thread.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Renders progress on a terminal: the downloading line is rewritten in place
/// and each finished file gets its own line.
pub struct ConsoleReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn render(&self, event: &ProgressEvent) -> std::io::Result<()> {
        let mut out = self.out.lock();
        match event.phase {
            ProgressPhase::Downloading => {
                write!(out, "\r{}", event.status_line(&event.filename))?;
            }
            ProgressPhase::Finished => {
                writeln!(out, "\n✓ Download completed: {}", event.filename)?;
            }
        }
        out.flush()
    }
}

impl<W: Write + Send> ProgressSink for ConsoleReporter<W> {
    fn on_event(&self, event: ProgressEvent) {
        // A closed terminal must not abort the download
        if let Err(e) = self.render(&event) {
            tracing::debug!("Failed to write progress: {}", e);
        }
    }
}
