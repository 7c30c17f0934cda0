use std::time::Duration;
use thiserror::Error;

/// Failure of a single metrics query.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{query} timed out after {after:?}")]
    Timeout {
        query: &'static str,
        after: Duration,
    },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("{0}")]
    Unavailable(String),

    #[error("blocking query failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;
