use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not classify response from {url}: {source}")]
    Classify {
        url: String,
        #[source]
        source: rxstore_core::CoreError,
    },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("cannot build request URL for \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },

    /// A failure from a fetch that several callers were waiting on.
    #[error(transparent)]
    Shared(Arc<ClientError>),
}

impl ClientError {
    /// The underlying error, looking through [`ClientError::Shared`].
    #[must_use]
    pub fn root(&self) -> &ClientError {
        match self {
            Self::Shared(inner) => inner.root(),
            other => other,
        }
    }

    pub(crate) fn from_shared(err: Arc<ClientError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(Self::Shared)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state store at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored value for {key} has an unexpected shape: {source}")]
    Shape {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
