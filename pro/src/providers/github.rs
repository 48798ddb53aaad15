//! GitHub pull requests through octocrab.

use super::{OpenRequest, ProviderError, ProviderKind, RequestProvider};
use async_trait::async_trait;
use octocrab::models::pulls::PullRequest;
use octocrab::models::IssueState;
use octocrab::params::State;
use octocrab::{Octocrab, Page};
use serde::Deserialize;
use tracing::{debug, info, info_span, Instrument};

/// Results per page for pull request listing.
const RESULTS_PER_PAGE: u8 = 100;

/// Authenticated GitHub client.
pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    /// Builds a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::GitHub`] if the client cannot be built.
    pub fn new(token: &str) -> Result<Self, ProviderError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| ProviderError::GitHub(Box::new(e)))?;
        Ok(Self { octocrab })
    }
}

/// Entry of `GET /repos/{path}/git/refs/heads`.
#[derive(Debug, Deserialize)]
struct RefEntry {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[async_trait]
impl RequestProvider for GitHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn verify_user(&self) -> Result<u64, ProviderError> {
        let user = self
            .octocrab
            .current()
            .user()
            .await
            .map_err(|e| map_error(e, "user"))?;
        debug!(login = %user.login, "Token belongs to user");
        Ok(user.id.0)
    }

    async fn requests_for_branch(
        &self,
        project_path: &str,
        branch: &str,
    ) -> Result<Vec<OpenRequest>, ProviderError> {
        let (owner, repo) = split_project_path(project_path)?;
        let span = info_span!("github_pulls", project = %project_path, branch = %branch);

        async {
            info!("Looking up pull requests for branch");
            let page = self
                .octocrab
                .pulls(owner, repo)
                .list()
                .state(State::Open)
                .head(format!("{owner}:{branch}"))
                .per_page(RESULTS_PER_PAGE)
                .send()
                .await
                .map_err(|e| map_error(e, project_path))?;

            Ok(page.items.into_iter().map(to_open_request).collect())
        }
        .instrument(span)
        .await
    }

    async fn list_open_requests(&self, project_path: &str) -> Result<Vec<OpenRequest>, ProviderError> {
        let (owner, repo) = split_project_path(project_path)?;
        let span = info_span!("github_list_pulls", project = %project_path);

        async {
            info!("Listing open pull requests");
            let page = self
                .octocrab
                .pulls(owner, repo)
                .list()
                .state(State::Open)
                .per_page(RESULTS_PER_PAGE)
                .send()
                .await
                .map_err(|e| map_error(e, project_path))?;

            let pulls = self
                .octocrab
                .all_pages(page)
                .await
                .map_err(|e| map_error(e, project_path))?;

            debug!(count = pulls.len(), "Fetched pull requests");
            Ok(pulls.into_iter().map(to_open_request).collect())
        }
        .instrument(span)
        .await
    }

    async fn list_remote_branches(&self, project_path: &str) -> Result<Vec<String>, ProviderError> {
        let route = format!("/repos/{project_path}/git/refs/heads");
        let span = info_span!("github_list_branches", project = %project_path);

        async {
            info!("Listing remote branches");
            let page: Page<RefEntry> = self
                .octocrab
                .get(route, Some(&[("per_page", RESULTS_PER_PAGE)]))
                .await
                .map_err(|e| map_error(e, project_path))?;

            let refs = self
                .octocrab
                .all_pages(page)
                .await
                .map_err(|e| map_error(e, project_path))?;

            debug!(count = refs.len(), "Fetched branches");
            Ok(branch_names(refs))
        }
        .instrument(span)
        .await
    }
}

/// Splits "owner/repo" into its two parts.
fn split_project_path(project_path: &str) -> Result<(&str, &str), ProviderError> {
    project_path
        .split_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
        .ok_or_else(|| ProviderError::NotFound {
            project: project_path.to_string(),
        })
}

fn to_open_request(pull: PullRequest) -> OpenRequest {
    let state = match pull.state {
        Some(IssueState::Open) => "open",
        Some(_) => "closed",
        None => "",
    };

    OpenRequest {
        title: pull.title.unwrap_or_default(),
        number: pull.number,
        state: state.to_string(),
        source_branch: pull.head.ref_field,
        web_url: pull.html_url.map(|url| url.to_string()).unwrap_or_default(),
    }
}

fn branch_names(refs: Vec<RefEntry>) -> Vec<String> {
    refs.into_iter()
        .map(|entry| {
            entry
                .ref_name
                .strip_prefix("refs/heads/")
                .map(str::to_string)
                .unwrap_or(entry.ref_name)
        })
        .collect()
}

/// Maps octocrab errors onto provider errors by HTTP status.
fn map_error(error: octocrab::Error, project: &str) -> ProviderError {
    if let octocrab::Error::GitHub { source, .. } = &error {
        match source.status_code.as_u16() {
            401 => return ProviderError::Unauthorized,
            404 => {
                return ProviderError::NotFound {
                    project: project.to_string(),
                }
            }
            _ => {}
        }
    }
    ProviderError::GitHub(Box::new(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_owner_and_repo() {
        assert_eq!(split_project_path("wowu/pro").unwrap(), ("wowu", "pro"));
        assert!(split_project_path("wowu").is_err());
        assert!(split_project_path("a/b/c").is_err());
        assert!(split_project_path("/pro").is_err());
    }

    #[test]
    fn maps_pull_request_fields() {
        let pull: PullRequest = serde_json::from_str(
            r#"{
                "url": "https://api.github.com/repos/wowu/pro/pulls/12",
                "id": 1203,
                "number": 12,
                "state": "open",
                "title": "Add list command",
                "html_url": "https://github.com/wowu/pro/pull/12",
                "head": {"label": "wowu:list", "ref": "list", "sha": "aa11"},
                "base": {"label": "wowu:main", "ref": "main", "sha": "bb22"}
            }"#,
        )
        .unwrap();

        let request = to_open_request(pull);

        assert_eq!(
            request,
            OpenRequest {
                title: "Add list command".to_string(),
                number: 12,
                state: "open".to_string(),
                source_branch: "list".to_string(),
                web_url: "https://github.com/wowu/pro/pull/12".to_string(),
            }
        );
        assert!(request.is_open());
    }

    #[test]
    fn strips_heads_prefix_from_refs() {
        let refs: Vec<RefEntry> = serde_json::from_str(
            r#"[
                {"ref": "refs/heads/main", "object": {"sha": "aa"}},
                {"ref": "refs/heads/feature/login", "object": {"sha": "bb"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(branch_names(refs), vec!["main", "feature/login"]);
    }
}
