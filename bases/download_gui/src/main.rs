mod app;
mod config;

use app::DownloaderApp;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use eframe::egui;
use tracing_subscriber::EnvFilter;

const TITLE: &str = "YouTube Playlist Downloader";

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "download_gui=info,download_session=info,media_downloader=info".into()),
        )
        .init();

    let args = config::CliArgs::parse();
    let config = config::Config::from_args(args, &std::env::current_dir()?);

    // Background context for download workers; the UI keeps the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("download-worker")
        .enable_all()
        .build()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_inner_size([700.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| Box::new(DownloaderApp::new(cc, runtime, config))),
    )
    .map_err(|e| eyre!("{}", e))
}
