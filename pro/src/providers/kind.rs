//! Supported hosting providers.

use serde::Serialize;
use std::fmt;
use url::Url;

/// A hosted git provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// github.com pull requests.
    GitHub,
    /// gitlab.com merge requests.
    GitLab,
}

impl ProviderKind {
    /// Selects the provider serving a remote host.
    #[must_use]
    pub fn from_host(host: &str) -> Option<Self> {
        match host {
            "github.com" => Some(Self::GitHub),
            "gitlab.com" => Some(Self::GitLab),
            _ => None,
        }
    }

    /// Lowercase name used on the command line and in config keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
        }
    }

    /// What the provider calls a proposed change.
    #[must_use]
    pub fn request_noun(self) -> &'static str {
        match self {
            Self::GitHub => "pull request",
            Self::GitLab => "merge request",
        }
    }

    /// Prefix used when referring to a request number (`#12` or `!12`).
    #[must_use]
    pub fn number_prefix(self) -> char {
        match self {
            Self::GitHub => '#',
            Self::GitLab => '!',
        }
    }

    /// Page where a personal access token can be generated.
    #[must_use]
    pub fn token_page(self) -> &'static str {
        match self {
            Self::GitHub => "https://github.com/settings/tokens/new",
            Self::GitLab => {
                "https://gitlab.com/-/profile/personal_access_tokens?name=PR+opener&scopes=api"
            }
        }
    }

    /// Token scope needed to read requests.
    #[must_use]
    pub fn required_scope(self) -> &'static str {
        match self {
            Self::GitHub => "repo",
            Self::GitLab => "api",
        }
    }

    /// URL that starts a new request for `branch`.
    #[must_use]
    pub fn create_request_url(self, project_path: &str, branch: &str) -> String {
        match self {
            Self::GitHub => {
                let base = format!("https://github.com/{project_path}/pull/new");
                match Url::parse(&base) {
                    Ok(mut url) => {
                        // Slashes stay as separators; every segment is percent-encoded
                        if let Ok(mut segments) = url.path_segments_mut() {
                            segments.extend(branch.split('/'));
                        }
                        url.to_string()
                    }
                    Err(_) => format!("{base}/{branch}"),
                }
            }
            Self::GitLab => {
                let base = format!("https://gitlab.com/{project_path}/-/merge_requests/new");
                match Url::parse(&base) {
                    Ok(mut url) => {
                        url.query_pairs_mut()
                            .append_pair("merge_request[source_branch]", branch);
                        url.to_string()
                    }
                    Err(_) => format!("{base}?merge_request%5Bsource_branch%5D={branch}"),
                }
            }
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
