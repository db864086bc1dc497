use std::path::{Path, PathBuf};

/// yt-dlp template for items that belong to a playlist.
pub const COLLECTION_TEMPLATE: &str = "%(playlist)s/%(title)s.%(ext)s";

/// yt-dlp template for a lone video.
pub const SINGLE_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Where downloaded files end up on disk.
///
/// Collections get one subfolder per playlist with one file per item, named
/// by title. Single videos land directly in the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output template for a playlist-scoped run
    pub fn collection_template(&self) -> PathBuf {
        self.root.join(COLLECTION_TEMPLATE)
    }

    /// Output template for a single-video run
    pub fn single_template(&self) -> PathBuf {
        self.root.join(SINGLE_TEMPLATE)
    }
}
