//! Remote URL parsing error types.

use thiserror::Error;

/// Errors that can occur while parsing a remote URL.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The URL has neither a recognised scheme nor scp-like form.
    #[error("unable to parse remote URL '{url}': {reason}")]
    Unparsable { url: String, reason: String },
}
