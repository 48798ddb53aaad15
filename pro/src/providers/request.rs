//! Provider-neutral pull/merge request record.

use serde::Serialize;

/// An open pull request (GitHub) or merge request (GitLab).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenRequest {
    /// Request title.
    pub title: String,

    /// Number shown to users (`#N` on GitHub, `!N` on GitLab).
    pub number: u64,

    /// Provider state as reported ("open", "opened", "closed", ...).
    pub state: String,

    /// Name of the branch the request merges from.
    pub source_branch: String,

    /// Browser URL of the request.
    pub web_url: String,
}

impl OpenRequest {
    /// Returns true if the provider reports the request as open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state.as_str(), "open" | "opened")
    }
}
