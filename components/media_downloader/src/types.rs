use std::path::PathBuf;
use thiserror::Error;

/// Input problems caught before the engine is started.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No URL provided")]
    EmptyUrl,

    #[error("No download folder provided")]
    EmptyDestination,

    #[error("Cannot use download folder {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to run {command}: {source}")]
    ProcessFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    EngineFailed(String),

    #[error("Unexpected engine output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One entry of a collection that made it all the way to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: String,
    pub title: Option<String>,
}

/// What the engine resolved the URL into, after downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A playlist-like source. Entries that failed are `None` and keep
    /// their position.
    Collection {
        title: Option<String>,
        entries: Vec<Option<ItemSummary>>,
    },
    Single {
        title: Option<String>,
    },
}

impl Extraction {
    /// Number of collection entries that were downloaded; `None` for a
    /// single item.
    pub fn item_count(&self) -> Option<usize> {
        match self {
            Extraction::Collection { entries, .. } => {
                Some(entries.iter().filter(|entry| entry.is_some()).count())
            }
            Extraction::Single { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_count_skips_failed_entries() {
        let extraction = Extraction::Collection {
            title: Some("Mix".to_string()),
            entries: vec![
                Some(ItemSummary { id: "a".into(), title: None }),
                None,
                Some(ItemSummary { id: "c".into(), title: None }),
                None,
            ],
        };
        assert_eq!(extraction.item_count(), Some(2));
    }

    #[test]
    fn single_has_no_count() {
        let extraction = Extraction::Single { title: None };
        assert_eq!(extraction.item_count(), None);
    }

    #[test]
    fn destination_error_names_path() {
        let error = ValidationError::Destination {
            path: PathBuf::from("/nope/here"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/nope/here"), "got '{}'", message);
        assert!(message.contains("denied"), "got '{}'", message);
    }
}
