//! Error types shared across the crate.

use std::path::PathBuf;

use page_path::PathError;
use thiserror::Error;

use crate::retry::RetryError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed path {path:?}: {source}")]
    MalformedPath {
        path: String,
        #[source]
        source: PathError,
    },
    #[error("transfer of {document} failed: {source}")]
    Transfer {
        document: String,
        #[source]
        source: RetryError<TransferError>,
    },
    #[error("transform service failed: {0}")]
    Transform(#[from] RetryError<TransformError>),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn malformed(path: impl Into<String>, source: PathError) -> Self {
        Error::MalformedPath {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}

/// Failure talking to the page store (fetch or write-back).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("document {0} not found")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("permanent failure: {0}")]
    Permanent(String),
}

/// Failure of a single call to the translation service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("permanent failure: {0}")]
    Permanent(String),
}

/// Classifies an error for the retry loop.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for TransferError {
    fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Transient(_))
    }
}

impl Retryable for TransformError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransformError::RateLimited(_) | TransformError::Transient(_)
        )
    }
}
