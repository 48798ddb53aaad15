//! Runner configuration.

use crate::config::Config;
use std::path::{Path, PathBuf};

/// Inputs for a single invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory where repository discovery starts.
    start_path: PathBuf,
    /// Provider tokens, loaded once at startup.
    config: Config,
}

impl RunnerConfig {
    /// Creates a configuration for a run starting in `start_path`.
    pub fn new(start_path: PathBuf, config: Config) -> Self {
        Self { start_path, config }
    }

    /// Returns the directory where discovery starts.
    pub fn start_path(&self) -> &Path {
        &self.start_path
    }

    /// Returns the loaded token config.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
