//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or saving the token file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write a file.
    #[error("Failed to access config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize YAML content.
    #[error("Failed to parse config file '{path}': {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The home directory could not be determined.
    #[error("Unable to determine home directory")]
    NoHomeDirectory,
}
