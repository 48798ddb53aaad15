//! Outcomes of resolving the current branch to a request URL.

use crate::providers::{OpenRequest, ProviderKind};
use serde::Serialize;

/// Result of looking up the request for a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    /// An open request exists for the branch.
    Existing {
        /// The matching request.
        request: OpenRequest,
    },

    /// No open request, but the branch exists on the remote.
    Missing {
        /// URL that starts a new request for the branch.
        create_url: String,
    },

    /// No open request and the branch was never pushed.
    NotPushed {
        /// The local branch name.
        branch: String,
    },
}

/// What `open` should show for the current checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// The current branch is a main branch; show the repository homepage.
    Homepage {
        /// Repository homepage URL.
        url: String,
    },

    /// Result of the provider lookup.
    Request {
        /// Provider that was queried.
        provider: ProviderKind,
        /// Current branch name.
        branch: String,
        /// Lookup result.
        lookup: Lookup,
    },
}

/// One selectable line of `pro list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Text shown in the selector.
    pub label: String,

    /// URL opened when the entry is chosen.
    pub url: String,
}
