use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("empty statement")]
    EmptyStatement,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote engine returned {status}: {message}")]
    RemoteApi { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// The query succeeded but produced no qualifying row.
    #[error("query with no results")]
    NoResults,

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{object} was not ready after {}s", .waited.as_secs())]
    Timeout { object: String, waited: Duration },

    #[error("migration {filename} was applied but could not be recorded: {source}")]
    Unrecorded {
        filename: String,
        #[source]
        source: Box<Error>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True for the sentinel raised when a query legitimately matched nothing.
    pub fn is_no_results(&self) -> bool {
        matches!(self, Self::NoResults)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
