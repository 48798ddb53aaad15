//! Git repository location and metadata extraction.
//!
//! Finds the repository enclosing a directory, tells external worktrees
//! apart from regular checkouts, and reads the current branch and the
//! `origin` remote URL.

mod error;

pub use error::RepositoryError;

use bstr::ByteSlice;
use git2::ErrorCode;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Prefix of a symbolic HEAD that points at a local branch.
const HEAD_BRANCH_PREFIX: &str = "ref: refs/heads/";

/// A git repository discovered on disk.
///
/// Built once by [`Repository::find_in_parents`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Directory in which the repository was found.
    working_directory: PathBuf,

    /// Main `.git` directory holding the remote configuration.
    git_directory: PathBuf,

    /// Directory holding the `HEAD` of this checkout.
    ///
    /// For an external worktree this is `<main>/.git/worktrees/<name>`,
    /// otherwise it equals `git_directory`.
    worktree_git_directory: PathBuf,
}

impl Repository {
    /// Finds the git repository in `path` or the nearest parent directory.
    ///
    /// The search stops at the filesystem root (`/` or a drive root such as
    /// `C:\`). Only "not a repository" moves the search upwards; any other
    /// error is returned immediately.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no ancestor is a repository.
    pub fn find_in_parents(path: &Path) -> Result<Self, RepositoryError> {
        let start = std::path::absolute(path).map_err(|source| RepositoryError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;

        let mut current = start.as_path();
        loop {
            debug!(path = %current.display(), "Trying to open repository");
            match git2::Repository::open(current) {
                Ok(repository) => {
                    let repository = Self::from_git_dir(current, repository.path());
                    info!(
                        git_dir = %repository.git_directory.display(),
                        worktree = repository.is_worktree(),
                        "Found repository"
                    );
                    return Ok(repository);
                }
                Err(e) if e.code() == ErrorCode::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            // `/` and drive roots such as `C:\` have no parent
            let Some(parent) = current.parent() else {
                return Err(RepositoryError::NotFound { start });
            };
            current = parent;
        }
    }

    /// Classifies the on-disk git directory of a repository opened in
    /// `working_directory`.
    fn from_git_dir(working_directory: &Path, git_dir: &Path) -> Self {
        let git_dir = strip_trailing_separator(git_dir);

        if is_worktree_git_dir(&git_dir) {
            // <main>/.git/worktrees/<name> -> <main>/.git
            let main_git_dir = git_dir
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| git_dir.clone());

            return Self {
                working_directory: working_directory.to_path_buf(),
                git_directory: main_git_dir,
                worktree_git_directory: git_dir,
            };
        }

        Self {
            working_directory: working_directory.to_path_buf(),
            git_directory: git_dir.clone(),
            worktree_git_directory: git_dir,
        }
    }

    /// Directory in which the repository was found.
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The main `.git` directory.
    #[must_use]
    pub fn git_directory(&self) -> &Path {
        &self.git_directory
    }

    /// The git directory containing the `HEAD` of this checkout.
    #[must_use]
    pub fn worktree_git_directory(&self) -> &Path {
        &self.worktree_git_directory
    }

    /// Returns true if this checkout is an external worktree.
    #[must_use]
    pub fn is_worktree(&self) -> bool {
        self.git_directory != self.worktree_git_directory
    }

    /// Returns the name of the branch checked out in this worktree.
    ///
    /// HEAD is read directly from [`Self::worktree_git_directory`] because
    /// worktree HEADs do not live in the main git directory.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NoActiveBranch`] when HEAD is detached and
    /// [`RepositoryError::ReadHead`] when the file cannot be read.
    pub fn current_branch_name(&self) -> Result<String, RepositoryError> {
        let head_path = self.worktree_git_directory.join("HEAD");
        let contents =
            std::fs::read_to_string(&head_path).map_err(|source| RepositoryError::ReadHead {
                path: head_path.clone(),
                source,
            })?;

        parse_head(&contents).ok_or(RepositoryError::NoActiveBranch)
    }

    /// Returns the first URL of the `origin` remote, unparsed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NoRemoteOrigin`] if there is no `origin`.
    pub fn origin_url(&self) -> Result<String, RepositoryError> {
        let repository = git2::Repository::open(&self.git_directory)?;

        match repository.find_remote("origin") {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::NotFound => return Err(RepositoryError::NoRemoteOrigin),
            Err(e) => return Err(e.into()),
        }

        // Remote::url() reports the last value; the first one wins here
        let config = repository.config()?;
        let mut urls = config.multivar("remote.origin.url", None)?;
        let first = match urls.next() {
            Some(entry) => entry?.value().map(str::to_string),
            None => None,
        };

        first
            .filter(|url| !url.is_empty())
            .ok_or(RepositoryError::OriginWithoutUrl)
    }
}

/// Extracts the branch name from the contents of a HEAD file.
///
/// Returns `None` for a detached HEAD or a ref that is not a valid branch.
fn parse_head(contents: &str) -> Option<String> {
    let branch = contents.trim_end().strip_prefix(HEAD_BRANCH_PREFIX)?;
    if branch.is_empty() {
        return None;
    }

    let full_name = format!("refs/heads/{branch}");
    gix_validate::reference::name(full_name.as_bytes().as_bstr()).ok()?;

    Some(branch.to_string())
}

/// Returns true if `git_dir` is a `.git/worktrees/<name>` directory.
fn is_worktree_git_dir(git_dir: &Path) -> bool {
    let components: Vec<&OsStr> = git_dir
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();

    matches!(
        components.as_slice(),
        [.., dot_git, worktrees, _name] if *dot_git == ".git" && *worktrees == "worktrees"
    )
}

/// libgit2 reports git directories with a trailing separator.
fn strip_trailing_separator(path: &Path) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_from_head() {
        assert_eq!(
            parse_head("ref: refs/heads/feature-x\n"),
            Some("feature-x".to_string())
        );
    }

    #[test]
    fn parses_nested_branch_from_head() {
        assert_eq!(
            parse_head("ref: refs/heads/user/fix-login  \r\n"),
            Some("user/fix-login".to_string())
        );
    }

    #[test]
    fn detached_head_has_no_branch() {
        assert_eq!(parse_head("4b825dc642cb6eb9a060e54bf8d69288fbee4904\n"), None);
    }

    #[test]
    fn non_branch_ref_has_no_branch() {
        assert_eq!(parse_head("ref: refs/tags/v1.0.0\n"), None);
        assert_eq!(parse_head("ref: refs/heads/\n"), None);
    }

    #[test]
    fn invalid_ref_name_has_no_branch() {
        assert_eq!(parse_head("ref: refs/heads/bad..name\n"), None);
    }

    #[test]
    fn detects_worktree_git_dir() {
        assert!(is_worktree_git_dir(Path::new(
            "/home/me/repo/.git/worktrees/repo-external"
        )));
        assert!(!is_worktree_git_dir(Path::new("/home/me/repo/.git")));
        assert!(!is_worktree_git_dir(Path::new(
            "/home/me/repo/.git/worktrees"
        )));
    }

    #[test]
    fn classifies_worktree() {
        let repository = Repository::from_git_dir(
            Path::new("/work/external"),
            Path::new("/work/main/.git/worktrees/external/"),
        );

        assert!(repository.is_worktree());
        assert_eq!(repository.git_directory(), Path::new("/work/main/.git"));
        assert_eq!(
            repository.worktree_git_directory(),
            Path::new("/work/main/.git/worktrees/external")
        );
    }

    #[test]
    fn classifies_regular_checkout() {
        let repository =
            Repository::from_git_dir(Path::new("/work/main/src"), Path::new("/work/main/.git/"));

        assert!(!repository.is_worktree());
        assert_eq!(repository.git_directory(), Path::new("/work/main/.git"));
        assert_eq!(repository.working_directory(), Path::new("/work/main/src"));
    }
}
