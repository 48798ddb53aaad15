//! Runner error types.

use crate::providers::{ProviderError, ProviderKind};
use crate::remote::RemoteError;
use crate::repository::RepositoryError;

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Repository location and metadata errors.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The origin URL could not be parsed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The origin host is neither GitHub nor GitLab.
    #[error("unknown remote type: {host}")]
    UnsupportedHost { host: String },

    /// Provider API errors.
    #[error("unable to get {noun}s: {source}")]
    Provider {
        /// Provider that failed.
        provider: ProviderKind,
        /// Project the call was for.
        project: String,
        /// What the provider calls its requests.
        noun: &'static str,
        #[source]
        source: ProviderError,
    },
}

impl RunnerError {
    pub(crate) fn provider(provider: ProviderKind, project: &str, source: ProviderError) -> Self {
        Self::Provider {
            provider,
            project: project.to_string(),
            noun: provider.request_noun(),
            source,
        }
    }
}
