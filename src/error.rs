use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of a mutation run. Per-mutant toolchain failures are not
/// here; they are recorded on the mutant itself as a `NotViable` note.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{} is not in a Go module: {reason}", .path.display())]
    Module { path: PathBuf, reason: String },

    #[error("failed to gather coverage: {0}")]
    Coverage(String),

    #[error("failed to parse {}: {reason}", .path.display())]
    Scan { path: PathBuf, reason: String },

    #[error("sandbox failure at {}: {source}", .path.display())]
    Sandbox {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("all {workers} workers failed; first failure: {first}")]
    WorkersExhausted { workers: usize, first: String },
}

impl Error {
    pub fn sandbox(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Sandbox {
            path: path.into(),
            source,
        }
    }
}
