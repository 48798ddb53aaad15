//! Matching the current branch to an open pull/merge request.

mod outcome;

pub use outcome::{ListEntry, Lookup, OpenOutcome};

use crate::providers::{OpenRequest, ProviderError, RequestProvider};
use crate::remote::RemoteRef;
use tracing::{debug, info};

/// Branch names treated as the repository's main line.
pub const MAIN_BRANCHES: [&str; 4] = ["master", "main", "trunk", "develop"];

/// Returns true if `branch` is one of [`MAIN_BRANCHES`].
#[must_use]
pub fn is_main_branch(branch: &str) -> bool {
    MAIN_BRANCHES.contains(&branch)
}

/// Picks the first open request whose source branch is `branch`.
#[must_use]
pub fn select_request(requests: Vec<OpenRequest>, branch: &str) -> Option<OpenRequest> {
    requests
        .into_iter()
        .find(|request| request.source_branch == branch && request.is_open())
}

/// Looks up the open request for `branch`.
///
/// When none matches, the remote's branch list decides between
/// [`Lookup::Missing`] and [`Lookup::NotPushed`].
///
/// # Errors
///
/// Returns any [`ProviderError`] from the provider calls.
pub async fn find_request_for_branch(
    provider: &dyn RequestProvider,
    project_path: &str,
    branch: &str,
) -> Result<Lookup, ProviderError> {
    let requests = provider.requests_for_branch(project_path, branch).await?;
    debug!(count = requests.len(), "Candidate requests");

    if let Some(request) = select_request(requests, branch) {
        info!(number = request.number, url = %request.web_url, "Found open request");
        return Ok(Lookup::Existing { request });
    }

    let remote_branches = provider.list_remote_branches(project_path).await?;
    if !remote_branches.iter().any(|name| name == branch) {
        info!(branch = %branch, "Branch does not exist on remote");
        return Ok(Lookup::NotPushed {
            branch: branch.to_string(),
        });
    }

    Ok(Lookup::Missing {
        create_url: provider.kind().create_request_url(project_path, branch),
    })
}

/// Builds the `pro list` entries: the homepage followed by every open request.
///
/// # Errors
///
/// Returns any [`ProviderError`] from the provider call.
pub async fn list_entries(
    provider: &dyn RequestProvider,
    remote: &RemoteRef,
) -> Result<Vec<ListEntry>, ProviderError> {
    let requests = provider.list_open_requests(&remote.project_path).await?;
    let prefix = provider.kind().number_prefix();

    let mut entries = Vec::with_capacity(requests.len() + 1);
    entries.push(ListEntry {
        label: format!("Repository homepage ({})", remote.project_path),
        url: remote.homepage_url(),
    });
    entries.extend(requests.into_iter().map(|request| ListEntry {
        label: format!("{} ({prefix}{})", request.title, request.number),
        url: request.web_url,
    }));

    Ok(entries)
}
