use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::engine::Extractor;
use crate::progress::{ProgressEvent, ProgressSink, PROGRESS_TEMPLATE};
use crate::request::EngineConfig;
use crate::types::{DownloadError, Extraction, ItemSummary};

/// Printed once per item after it has been moved into place.
const ITEM_MARKER: &str = "[item]";
const ITEM_TEMPLATE: &str = "after_move:[item]%(id)s|%(title)s";

/// yt-dlp driven as a child process.
pub struct YtDlp {
    binary: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    fn command_name(&self) -> String {
        self.binary.display().to_string()
    }

    async fn probe(&self, url: &str) -> Result<Probe, DownloadError> {
        debug!("Probing {}", url);
        let output = self
            .command()
            .args(probe_args(url))
            .output()
            .await
            .map_err(|source| DownloadError::ProcessFailed {
                command: self.command_name(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(DownloadError::EngineFailed(
                last_error_line(stderr.lines())
                    .unwrap_or_else(|| format!("yt-dlp exited with status: {}", output.status)),
            ));
        }
        if !output.status.success() {
            debug!("Probe finished with {}: {}", output.status, stderr.trim());
        }

        Probe::parse(&output.stdout)
    }
}

#[async_trait]
impl Extractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn check_available(&self) -> Result<(), DownloadError> {
        which::which(&self.binary)
            .map(|_| ())
            .map_err(|_| DownloadError::DependencyNotFound(self.command_name()))
    }

    async fn extract(
        &self,
        url: &str,
        config: &EngineConfig,
        sink: &dyn ProgressSink,
    ) -> Result<Extraction, DownloadError> {
        let probe = self.probe(url).await?;

        let template = match &probe.entries {
            Some(entries) => {
                info!(
                    "Resolved {} as collection '{}' with {} entries",
                    url,
                    probe.title.as_deref().unwrap_or("?"),
                    entries.len()
                );
                config.output.collection_template()
            }
            None => {
                info!("Resolved {} as a single item", url);
                config.output.single_template()
            }
        };

        let mut child = self
            .command()
            .args(download_args(url, config, &template))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DownloadError::ProcessFailed {
                command: self.command_name(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::InvalidOutput("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::InvalidOutput("stderr not captured".to_string()))?;

        let read_stdout = async {
            let mut completed = Vec::new();
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(event) = ProgressEvent::parse_template_line(&line) {
                    sink.on_event(event);
                } else if let Some(item) = parse_item_line(&line) {
                    debug!("Completed item {}", item.id);
                    completed.push(item);
                } else if !line.trim().is_empty() {
                    debug!("yt-dlp: {}", line);
                }
            }
            Ok::<_, std::io::Error>(completed)
        };

        let read_stderr = async {
            let mut diagnostics = Diagnostics::default();
            let mut lines = BufReader::new(stderr).lines();
            while let Some(line) = lines.next_line().await? {
                if line.starts_with("ERROR:") {
                    warn!("{}", line);
                    diagnostics.errors.push(line.clone());
                } else {
                    debug!("yt-dlp: {}", line);
                }
                if !line.trim().is_empty() {
                    diagnostics.last_line = Some(line.trim().to_string());
                }
            }
            Ok::<_, std::io::Error>(diagnostics)
        };

        let (completed, diagnostics) = tokio::try_join!(read_stdout, read_stderr)?;
        let status = child.wait().await?;

        match probe.entries {
            Some(entries) => {
                if !status.success() {
                    if !item_failures_explain(&status, &diagnostics, &completed) {
                        return Err(diagnostics.into_failure(&status));
                    }
                    warn!(
                        "yt-dlp exited with {} after {} failed item(s)",
                        status,
                        diagnostics.errors.len()
                    );
                }
                Ok(Extraction::Collection {
                    title: probe.title,
                    entries: settle_entries(entries, completed),
                })
            }
            None => {
                if !status.success() {
                    return Err(diagnostics.into_failure(&status));
                }
                let title = completed
                    .into_iter()
                    .next()
                    .and_then(|item| item.title)
                    .or(probe.title);
                Ok(Extraction::Single { title })
            }
        }
    }
}

fn probe_args(url: &str) -> Vec<OsString> {
    ["--flat-playlist", "--dump-single-json", "--ignore-errors", "--", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn download_args(url: &str, config: &EngineConfig, template: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-f".into(), config.format.as_str().into()];

    args.push(if config.ignore_errors {
        "--ignore-errors".into()
    } else {
        "--abort-on-error".into()
    });

    args.extend(
        [
            "--newline",
            "--progress",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "--no-simulate",
            "--print",
            ITEM_TEMPLATE,
        ]
        .into_iter()
        .map(OsString::from),
    );

    if let Some(audio) = &config.audio {
        args.extend(
            ["-x", "--audio-format", audio.codec, "--audio-quality", audio.quality]
                .into_iter()
                .map(OsString::from),
        );
    }

    args.push("-o".into());
    args.push(template.as_os_str().to_owned());
    args.push("--".into());
    args.push(url.into());
    args
}

fn parse_item_line(line: &str) -> Option<ItemSummary> {
    let rest = line.trim_end().strip_prefix(ITEM_MARKER)?;
    let (id, title) = match rest.split_once('|') {
        Some((id, title)) => (id, Some(title)),
        None => (rest, None),
    };
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some(ItemSummary {
        id: id.to_string(),
        title: title
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "NA")
            .map(str::to_string),
    })
}

/// What yt-dlp said on stderr during a download.
#[derive(Debug, Default)]
struct Diagnostics {
    errors: Vec<String>,
    last_line: Option<String>,
}

impl Diagnostics {
    fn into_failure(self, status: &ExitStatus) -> DownloadError {
        let message = last_error_line(self.errors.iter().map(String::as_str))
            .or(self.last_line)
            .unwrap_or_else(|| format!("yt-dlp exited with status: {}", status));
        DownloadError::EngineFailed(message)
    }
}

/// A failed collection run only counts as partial success when yt-dlp
/// exited on its own and either reported item errors or finished something.
fn item_failures_explain(
    status: &ExitStatus,
    diagnostics: &Diagnostics,
    completed: &[ItemSummary],
) -> bool {
    status.code().is_some() && (!diagnostics.errors.is_empty() || !completed.is_empty())
}

/// Line-up the probed entries with the items that actually completed.
/// Anything that never completed becomes `None`.
///
/// Flat entries do not always carry the id of the video that ends up being
/// downloaded (generic `url` results, channel tabs). When any completed item
/// can't be found among the probed ids the list is rebuilt from the
/// completed items instead, padded with `None` up to the probed length.
fn settle_entries(
    probed: Vec<Option<ProbeEntry>>,
    completed: Vec<ItemSummary>,
) -> Vec<Option<ItemSummary>> {
    let lined_up = completed.iter().all(|item| {
        probed
            .iter()
            .flatten()
            .any(|entry| entry.id.as_deref() == Some(item.id.as_str()))
    });

    if !lined_up || probed.is_empty() {
        let missing = probed.len().saturating_sub(completed.len());
        return completed
            .into_iter()
            .map(Some)
            .chain(std::iter::repeat_with(|| None).take(missing))
            .collect();
    }

    probed
        .into_iter()
        .map(|entry| {
            let entry = entry?;
            let id = entry.id?;
            completed
                .iter()
                .find(|item| item.id == id)
                .map(|item| ItemSummary {
                    id,
                    title: item.title.clone().or(entry.title),
                })
        })
        .collect()
}

fn last_error_line<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    lines
        .filter(|line| line.starts_with("ERROR:"))
        .last()
        .map(|line| line.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct Probe {
    title: Option<String>,
    /// Present only for playlist-like sources
    entries: Option<Vec<Option<ProbeEntry>>>,
}

#[derive(Debug, Deserialize)]
struct ProbeEntry {
    id: Option<String>,
    title: Option<String>,
}

impl Probe {
    fn parse(stdout: &[u8]) -> Result<Self, DownloadError> {
        let probe: Option<Probe> = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::InvalidOutput(e.to_string()))?;
        probe.ok_or_else(|| DownloadError::EngineFailed("Nothing could be extracted".to_string()))
    }
}
