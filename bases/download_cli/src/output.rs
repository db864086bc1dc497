use std::path::Path;

use media_downloader::{rule, DownloadOutcome, FormatChoice};

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_header(&self) {
        println!("\n{}", rule());
        println!("{:^60}", "YouTube Playlist Downloader");
        println!("{}\n", rule());
    }

    pub fn print_menu(&self) {
        println!("\nSelect format:");
        for (index, choice) in FormatChoice::ALL.iter().enumerate() {
            let suffix = if *choice == FormatChoice::Best {
                " (default)"
            } else {
                ""
            };
            println!("{}. {}{}", index + 1, choice.label(), suffix);
        }
    }

    pub fn print_download_start(&self, url: &str, location: &Path) {
        println!("\n{}", rule());
        println!("Starting download from: {}", url);
        println!("Save location: {}", location.display());
        println!("{}\n", rule());
    }

    pub fn print_outcome(&self, outcome: &DownloadOutcome, location: &Path) {
        print!("{}", outcome.banner());
        if outcome.succeeded {
            println!("All files saved to: {}", location.display());
        } else {
            println!("Download failed or incomplete");
        }
    }

    pub fn print_message(&self, message: &str) {
        println!("{}", message);
    }

    pub fn print_cancelled(&self) {
        println!("\n\nDownload cancelled by user");
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}
