use std::path::{Path, PathBuf};

use tracing::debug;

use crate::organization::OutputLayout;
use crate::types::ValidationError;

/// Codec audio-only runs are transcoded to.
pub const AUDIO_CODEC: &str = "mp3";

/// Bitrate target handed to the transcoder.
pub const AUDIO_QUALITY: &str = "192K";

const BEST_AUDIO: &str = "bestaudio/best";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QualityTier {
    #[default]
    Best,
    P1080,
    P720,
    P480,
}

impl QualityTier {
    /// Parse a tier label; anything unrecognised falls back to `Best`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "1080p" | "1080" => QualityTier::P1080,
            "720p" | "720" => QualityTier::P720,
            "480p" | "480" => QualityTier::P480,
            _ => QualityTier::Best,
        }
    }

    pub fn max_height(self) -> Option<u32> {
        match self {
            QualityTier::Best => None,
            QualityTier::P1080 => Some(1080),
            QualityTier::P720 => Some(720),
            QualityTier::P480 => Some(480),
        }
    }

    /// yt-dlp format selector for this tier
    pub fn format_selector(self) -> String {
        match self.max_height() {
            Some(height) => format!(
                "bestvideo[height<={height}]+bestaudio/best[height<={height}]"
            ),
            None => "bestvideo+bestaudio/best".to_string(),
        }
    }
}

/// The five options both shells offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormatChoice {
    #[default]
    Best,
    P1080,
    P720,
    P480,
    AudioOnly,
}

impl FormatChoice {
    pub const ALL: [FormatChoice; 5] = [
        FormatChoice::Best,
        FormatChoice::P1080,
        FormatChoice::P720,
        FormatChoice::P480,
        FormatChoice::AudioOnly,
    ];

    /// Map a console menu entry (`1`..=`5`) to a choice. Unknown input is `Best`.
    pub fn from_menu(input: &str) -> Self {
        match input.trim() {
            "2" => FormatChoice::P1080,
            "3" => FormatChoice::P720,
            "4" => FormatChoice::P480,
            "5" => FormatChoice::AudioOnly,
            _ => FormatChoice::Best,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatChoice::Best => "Best Quality",
            FormatChoice::P1080 => "1080p",
            FormatChoice::P720 => "720p",
            FormatChoice::P480 => "480p",
            FormatChoice::AudioOnly => "Audio Only (MP3)",
        }
    }

    pub fn quality(self) -> QualityTier {
        match self {
            FormatChoice::P1080 => QualityTier::P1080,
            FormatChoice::P720 => QualityTier::P720,
            FormatChoice::P480 => QualityTier::P480,
            FormatChoice::Best | FormatChoice::AudioOnly => QualityTier::Best,
        }
    }

    pub fn audio_only(self) -> bool {
        self == FormatChoice::AudioOnly
    }
}

/// Post-processing step that turns the downloaded stream into an audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: &'static str,
    pub quality: &'static str,
}

/// Everything the extraction engine needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub format: String,
    pub audio: Option<AudioExtraction>,
    pub output: OutputLayout,
    /// Keep going when a single entry of a collection fails.
    pub ignore_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub source_url: String,
    pub destination: PathBuf,
    pub quality: QualityTier,
    pub audio_only: bool,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            destination: destination.into(),
            quality: QualityTier::Best,
            audio_only: false,
        }
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    pub fn with_choice(self, choice: FormatChoice) -> Self {
        self.with_quality(choice.quality())
            .with_audio_only(choice.audio_only())
    }

    /// URL with surrounding whitespace removed
    pub fn url(&self) -> &str {
        self.source_url.trim()
    }

    /// Checks that need no filesystem access.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url().is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        if self.destination.as_os_str().is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        Ok(())
    }

    /// Validate the request, make sure the destination exists and produce
    /// the engine configuration.
    pub fn build(&self) -> Result<EngineConfig, ValidationError> {
        self.validate()?;
        ensure_directory(&self.destination)?;

        let (format, audio) = if self.audio_only {
            let audio = AudioExtraction {
                codec: AUDIO_CODEC,
                quality: AUDIO_QUALITY,
            };
            (BEST_AUDIO.to_string(), Some(audio))
        } else {
            (self.quality.format_selector(), None)
        };

        debug!(
            "Built engine config for {} with format '{}'",
            self.url(),
            format
        );

        Ok(EngineConfig {
            format,
            audio,
            output: OutputLayout::new(&self.destination),
            ignore_errors: true,
        })
    }
}

fn ensure_directory(path: &Path) -> Result<(), ValidationError> {
    std::fs::create_dir_all(path).map_err(|source| ValidationError::Destination {
        path: path.to_path_buf(),
        source,
    })
}
