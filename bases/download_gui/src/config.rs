use clap::Parser;
use std::path::{Path, PathBuf};

/// Window configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder shown in the form on start
    pub folder: PathBuf,

    /// yt-dlp executable to run
    pub yt_dlp: PathBuf,
}

/// YouTube Playlist Downloader - GUI Version
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Initial download folder (defaults to ./downloads)
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// yt-dlp executable to run
    #[arg(long, env = "YT_DLP", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,
}

impl Config {
    /// Create configuration from CLI arguments, resolving the folder against
    /// `cwd`
    pub fn from_args(args: CliArgs, cwd: &Path) -> Self {
        let folder = args.folder.unwrap_or_else(|| PathBuf::from("downloads"));
        let folder = if folder.is_absolute() {
            folder
        } else {
            cwd.join(folder)
        };

        Self {
            folder,
            yt_dlp: args.yt_dlp,
        }
    }
}
