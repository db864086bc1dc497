use clap::Parser;
use std::path::PathBuf;

/// Download a playlist or a single video with yt-dlp.
///
/// Anything not given on the command line is asked for interactively.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Playlist or video URL
    pub url: Option<String>,

    /// Directory to store downloaded files (prompted for, default "downloads")
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Format menu entry: 1 best, 2 1080p, 3 720p, 4 480p, 5 audio only (MP3)
    #[arg(short, long)]
    pub format: Option<String>,

    /// yt-dlp executable to run
    #[arg(long, env = "YT_DLP", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit with status 1 when the download fails
    #[arg(long)]
    pub strict_exit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_is_optional() {
        let args = Args::try_parse_from(["download-cli"]).unwrap();
        assert!(args.url.is_none());
        assert!(args.output_dir.is_none());
        assert!(!args.strict_exit);
    }

    #[test]
    fn full_command_line() {
        let args = Args::try_parse_from([
            "download-cli",
            "https://example.com/list",
            "-o",
            "music",
            "-f",
            "5",
            "--yt-dlp",
            "/opt/yt-dlp",
            "--strict-exit",
        ])
        .unwrap();

        assert_eq!(args.url.as_deref(), Some("https://example.com/list"));
        assert_eq!(args.output_dir, Some(PathBuf::from("music")));
        assert_eq!(args.format.as_deref(), Some("5"));
        assert_eq!(args.yt_dlp, PathBuf::from("/opt/yt-dlp"));
        assert!(args.strict_exit);
    }
}
