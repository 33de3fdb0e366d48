use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single call against the places provider.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// `denied` marks authentication or billing failures, which make every
    /// further call pointless.
    #[error("search unavailable: {reason}")]
    SearchUnavailable { reason: String, denied: bool },
}

impl SearchError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::SearchUnavailable {
            reason: reason.into(),
            denied: false,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::SearchUnavailable {
            reason: reason.into(),
            denied: true,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::SearchUnavailable { denied: true, .. })
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no dataset at {}; run `atlas fetch` first", path.display())]
    DatasetMissing { path: PathBuf },

    #[error("failed to read or write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
