//! Persisted provider tokens.
//!
//! Tokens live in a small YAML file, by default `~/.config/pro/config.yml`.
//! The file is loaded once per invocation and handed to whoever needs a
//! token; it is only written by `pro auth`.

mod error;

pub use error::ConfigError;

use crate::providers::ProviderKind;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Contents of the token file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub personal access token.
    #[serde(default)]
    pub github_token: String,

    /// GitLab personal access token.
    #[serde(default)]
    pub gitlab_token: String,
}

impl Config {
    /// Default location of the token file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDirectory`] if `$HOME` cannot be resolved.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".config").join("pro").join("config.yml"))
    }

    /// Loads the token file, returning an empty config if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::IoError {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        // An empty file deserializes to YAML null
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|source| ConfigError::YamlError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Writes the token file, replacing any previous contents atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        };

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        create_config_dir(dir).map_err(io_error)?;

        let data = serde_yaml::to_string(self).map_err(|source| ConfigError::YamlError {
            path: path.display().to_string(),
            source,
        })?;

        // NamedTempFile is created with 0600 permissions
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(data.as_bytes()).map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        file.persist(path).map_err(|e| io_error(e.error))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Returns the stored token for a provider, or `None` if it is unset.
    #[must_use]
    pub fn token(&self, provider: ProviderKind) -> Option<&str> {
        let token = match provider {
            ProviderKind::GitHub => &self.github_token,
            ProviderKind::GitLab => &self.gitlab_token,
        };
        Some(token.as_str()).filter(|token| !token.trim().is_empty())
    }

    /// Stores a token for a provider, leaving the other one untouched.
    pub fn set_token(&mut self, provider: ProviderKind, token: String) {
        match provider {
            ProviderKind::GitHub => self.github_token = token,
            ProviderKind::GitLab => self.gitlab_token = token,
        }
    }
}

#[cfg(unix)]
fn create_config_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o750)
        .create(dir)
}

#[cfg(not(unix))]
fn create_config_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
