//! Orchestrates the `open` and `list` commands.

mod config;
mod error;

pub use config::RunnerConfig;
pub use error::RunnerError;

use crate::providers::{create_provider, ProviderKind, RequestProvider};
use crate::remote::RemoteRef;
use crate::repository::Repository;
use crate::resolver::{find_request_for_branch, is_main_branch, list_entries};
use crate::resolver::{ListEntry, OpenOutcome};
use tracing::{debug, info};

/// Runs commands against the repository enclosing the start path.
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Locates the repository enclosing the start path.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Repository`] if no repository is found.
    pub fn repository(&self) -> Result<Repository, RunnerError> {
        Ok(Repository::find_in_parents(self.config.start_path())?)
    }

    /// Resolves what `open` should show for the current branch.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] for a missing repository, remote or branch,
    /// an unsupported host, or a failed provider call.
    pub async fn open(&self) -> Result<OpenOutcome, RunnerError> {
        let repository = self.repository()?;
        let branch = repository.current_branch_name()?;
        info!(branch = %branch, "Current branch");

        let remote = RemoteRef::parse(&repository.origin_url()?)?;
        debug!(remote = %remote, "Parsed origin");

        if is_main_branch(&branch) {
            return Ok(OpenOutcome::Homepage {
                url: remote.homepage_url(),
            });
        }

        let provider = self.provider_for(&remote)?;
        let lookup = find_request_for_branch(provider.as_ref(), &remote.project_path, &branch)
            .await
            .map_err(|e| RunnerError::provider(provider.kind(), &remote.project_path, e))?;

        Ok(OpenOutcome::Request {
            provider: provider.kind(),
            branch,
            lookup,
        })
    }

    /// Builds the selectable entries for `list`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] for a missing repository or remote, an
    /// unsupported host, or a failed provider call.
    pub async fn list(&self) -> Result<Vec<ListEntry>, RunnerError> {
        let repository = self.repository()?;
        let remote = RemoteRef::parse(&repository.origin_url()?)?;

        let provider = self.provider_for(&remote)?;
        list_entries(provider.as_ref(), &remote)
            .await
            .map_err(|e| RunnerError::provider(provider.kind(), &remote.project_path, e))
    }

    /// Builds the provider client for the remote's host.
    fn provider_for(&self, remote: &RemoteRef) -> Result<Box<dyn RequestProvider>, RunnerError> {
        let kind = ProviderKind::from_host(&remote.host).ok_or_else(|| {
            RunnerError::UnsupportedHost {
                host: remote.host.clone(),
            }
        })?;
        let token = self.config.config().token(kind).unwrap_or_default();

        create_provider(kind, token)
            .map_err(|e| RunnerError::provider(kind, &remote.project_path, e))
    }
}

/// Checks a token against the provider's current-user endpoint.
///
/// # Errors
///
/// Returns the provider error, e.g. [`crate::ProviderError::Unauthorized`].
pub async fn verify_token(
    kind: ProviderKind,
    token: &str,
) -> Result<u64, crate::providers::ProviderError> {
    let provider = create_provider(kind, token)?;
    provider.verify_user().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::providers::ProviderError;
    use crate::repository::RepositoryError;
    use tempfile::TempDir;

    fn init_repo(dir: &std::path::Path, origin: Option<&str>) {
        let repo = git2::Repository::init(dir).unwrap();
        if let Some(url) = origin {
            repo.remote("origin", url).unwrap();
        }
        // Point HEAD at a branch without needing a commit
        std::fs::write(dir.join(".git/HEAD"), "ref: refs/heads/feature-x\n").unwrap();
    }

    fn runner(dir: &std::path::Path, config: Config) -> Runner {
        Runner::new(RunnerConfig::new(dir.to_path_buf(), config))
    }

    #[tokio::test]
    async fn open_without_origin_fails() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path(), None);

        let result = runner(temp.path(), Config::default()).open().await;
        assert!(matches!(
            result,
            Err(RunnerError::Repository(RepositoryError::NoRemoteOrigin))
        ));
    }

    #[tokio::test]
    async fn open_rejects_unknown_host() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path(), Some("git@bitbucket.org:acme/widgets.git"));

        let result = runner(temp.path(), Config::default()).open().await;
        assert!(matches!(
            result,
            Err(RunnerError::UnsupportedHost { host }) if host == "bitbucket.org"
        ));
    }

    #[tokio::test]
    async fn open_requires_token() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path(), Some("https://gitlab.com/acme/widgets.git"));

        let result = runner(temp.path(), Config::default()).open().await;
        assert!(matches!(
            result,
            Err(RunnerError::Provider {
                provider: ProviderKind::GitLab,
                source: ProviderError::MissingToken { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn open_on_main_branch_shows_homepage() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path(), Some("git@github.com:wowu/pro.git"));
        std::fs::write(temp.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();

        let outcome = runner(temp.path(), Config::default()).open().await.unwrap();
        assert_eq!(
            outcome,
            OpenOutcome::Homepage {
                url: "https://github.com/wowu/pro".to_string()
            }
        );
    }

    #[tokio::test]
    async fn open_on_detached_head_reports_no_branch() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path(), Some("git@github.com:wowu/pro.git"));
        std::fs::write(
            temp.path().join(".git/HEAD"),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904\n",
        )
        .unwrap();

        let result = runner(temp.path(), Config::default()).open().await;
        assert!(matches!(
            result,
            Err(RunnerError::Repository(RepositoryError::NoActiveBranch))
        ));
    }
}
