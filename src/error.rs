use std::path::PathBuf;

use thiserror::Error;

/// Failures of the update pipeline.
///
/// Only `DownloadFailed`, `InstallFailed` and `LaunchFailed` can end an
/// invocation; the orchestrator recovers the others as "no remote version" or
/// "cannot install".
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("release feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("release {tag} has no asset named '{expected}'")]
    AssetNotFound { tag: String, expected: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("install into {path} failed: {source}")]
    InstallFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start {path}: {reason}")]
    LaunchFailed { path: PathBuf, reason: String },
}

impl UpdateError {
    pub(crate) fn install(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InstallFailed {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
