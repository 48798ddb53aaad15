//! Provider API error types.

use super::ProviderKind;
use thiserror::Error;

/// Errors returned by provider API calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The token was rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The token has expired (GitLab only).
    #[error("token expired")]
    TokenExpired,

    /// The project does not exist or is not visible with this token.
    #[error("project not found: {project}")]
    NotFound { project: String },

    /// The provider answered with an unexpected status.
    #[error("unknown response code: {status} {body}")]
    UnknownStatus { status: u16, body: String },

    /// No token is stored for the provider.
    #[error("{provider} token is not set")]
    MissingToken { provider: ProviderKind },

    /// GitHub client error.
    #[error("GitHub API error: {0}")]
    GitHub(#[source] Box<octocrab::Error>),

    /// GitLab transport or decoding error.
    #[error("GitLab API error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be decoded.
    #[error("unable to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    /// Returns true if the user should run `pro auth` again.
    #[must_use]
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::TokenExpired | Self::MissingToken { .. }
        )
    }
}
