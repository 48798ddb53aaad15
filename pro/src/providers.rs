//! Hosted git providers and their pull/merge request APIs.
//!
//! GitHub and GitLab are two implementations of [`RequestProvider`],
//! selected from the host of the `origin` remote.

mod error;
mod github;
mod gitlab;
mod kind;
mod request;

pub use error::ProviderError;
pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use kind::ProviderKind;
pub use request::OpenRequest;

use async_trait::async_trait;

/// Read-only operations on a provider's pull/merge requests.
#[async_trait]
pub trait RequestProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Checks the token by fetching the current user, returning the user id.
    async fn verify_user(&self) -> Result<u64, ProviderError>;

    /// Open requests whose source branch is `branch`.
    ///
    /// Providers filter server-side; callers still apply
    /// [`crate::resolver::select_request`] to the result.
    async fn requests_for_branch(
        &self,
        project_path: &str,
        branch: &str,
    ) -> Result<Vec<OpenRequest>, ProviderError>;

    /// All open requests of the project.
    async fn list_open_requests(&self, project_path: &str) -> Result<Vec<OpenRequest>, ProviderError>;

    /// Names of the branches that exist on the remote.
    async fn list_remote_branches(&self, project_path: &str) -> Result<Vec<String>, ProviderError>;
}

/// Builds the client for a provider.
///
/// # Errors
///
/// Returns [`ProviderError::MissingToken`] for an empty token, or the
/// client's construction error.
pub fn create_provider(
    kind: ProviderKind,
    token: &str,
) -> Result<Box<dyn RequestProvider>, ProviderError> {
    if token.trim().is_empty() {
        return Err(ProviderError::MissingToken { provider: kind });
    }

    Ok(match kind {
        ProviderKind::GitHub => Box::new(GitHubClient::new(token)?),
        ProviderKind::GitLab => Box::new(GitLabClient::new(token)?),
    })
}
