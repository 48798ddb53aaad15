//! Repository location error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating a repository or reading its metadata.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No git repository in the start directory or any of its parents.
    #[error("no git repository found in '{start}' or any parent directory")]
    NotFound { start: PathBuf },

    /// HEAD does not point at a branch (e.g. detached HEAD).
    #[error("no active branch")]
    NoActiveBranch,

    /// The repository has no remote named `origin`.
    #[error("no remote named \"origin\" found")]
    NoRemoteOrigin,

    /// The `origin` remote exists but has no usable URL.
    #[error("remote \"origin\" has no URL configured")]
    OriginWithoutUrl,

    /// Failed to read the HEAD file.
    #[error("unable to read HEAD at '{path}': {source}")]
    ReadHead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to resolve the start path to an absolute path.
    #[error("unable to resolve path '{path}': {source}")]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other libgit2 failure while opening a repository.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}
