use thiserror::Error;

/// Errors from delivering a URL to the browser or clipboard.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The clipboard could not be opened or written.
    #[error("Unable to copy to clipboard: {0}")]
    Clipboard(#[from] arboard::Error),

    /// The background process holding the clipboard could not be started.
    #[cfg(target_os = "linux")]
    #[error("Unable to copy to clipboard: {0}")]
    ClipboardOwner(#[source] std::io::Error),

    /// The platform URL opener could not be started.
    #[error("Unable to open browser: {0}")]
    Browser(#[source] std::io::Error),

    /// No URL opener is known for this platform.
    #[cfg(not(any(unix, target_os = "windows")))]
    #[error("Unable to open browser: unsupported platform")]
    UnsupportedPlatform,
}
