use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::Result;
use media_downloader::{
    execute, ConsoleReporter, DownloadOutcome, DownloadRequest, Extractor, FormatChoice, YtDlp,
};
use tokio::io::AsyncBufRead;
use tracing::debug;

use crate::args::Args;
use crate::output::OutputHandler;
use crate::prompt::Prompter;

const DEFAULT_FOLDER: &str = "downloads";

pub struct App {
    args: Args,
    output: OutputHandler,
    extractor: Arc<dyn Extractor>,
}

impl App {
    pub fn new(args: Args) -> Self {
        let extractor = Arc::new(YtDlp::new(&args.yt_dlp));
        Self::with_extractor(args, extractor)
    }

    pub fn with_extractor(args: Args, extractor: Arc<dyn Extractor>) -> Self {
        let output = OutputHandler::new(args.verbose);
        Self {
            args,
            output,
            extractor,
        }
    }

    /// Collect the inputs, run the download and report on it.
    ///
    /// Returns `None` when the inputs were rejected and nothing ran.
    pub async fn run<R: AsyncBufRead + Unpin>(
        &self,
        prompter: &mut Prompter<R>,
    ) -> Result<Option<DownloadOutcome>> {
        self.output.print_header();

        let url = match &self.args.url {
            Some(url) => url.trim().to_string(),
            None => {
                prompter
                    .ask("Enter YouTube playlist URL (or video URL): ")
                    .await?
            }
        };
        if url.is_empty() {
            self.output.print_message("Error: No URL provided");
            return Ok(None);
        }

        let destination = match &self.args.output_dir {
            Some(dir) => dir.clone(),
            None => {
                let answer = prompter
                    .ask("Enter download folder (press Enter for 'downloads'): ")
                    .await?;
                if answer.is_empty() {
                    PathBuf::from(DEFAULT_FOLDER)
                } else {
                    PathBuf::from(answer)
                }
            }
        };

        let choice = match &self.args.format {
            Some(entry) => FormatChoice::from_menu(entry),
            None => {
                self.output.print_menu();
                FormatChoice::from_menu(&prompter.ask("\nEnter choice (1-5): ").await?)
            }
        };
        debug!("Selected {:?}", choice);

        let request = DownloadRequest::new(url, destination).with_choice(choice);
        let config = match request.build() {
            Ok(config) => config,
            Err(e) => {
                self.output.print_message(&format!("Error: {}", e));
                return Ok(None);
            }
        };

        let location = request
            .destination
            .canonicalize()
            .unwrap_or_else(|_| request.destination.clone());
        self.output.print_download_start(request.url(), &location);

        let reporter = ConsoleReporter::stdout();
        let outcome = execute(self.extractor.as_ref(), request.url(), &config, &reporter).await;

        self.output.print_outcome(&outcome, &location);
        Ok(Some(outcome))
    }

    pub fn print_cancelled(&self) {
        self.output.print_cancelled();
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
