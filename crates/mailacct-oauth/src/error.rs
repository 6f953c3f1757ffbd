//! Error types for `OAuth2` operations.

use std::io;
use std::string::FromUtf8Error;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The refresh command could not be started.
    #[error("Unable to run refresh command: {0}")]
    Spawn(#[source] io::Error),

    /// Reading the refresh command's output failed.
    #[error("Unable to read refresh command output: {0}")]
    Read(#[source] io::Error),

    /// The refresh command's first line is not UTF-8.
    #[error("Refresh command output is not valid UTF-8: {0}")]
    Decode(#[source] FromUtf8Error),
}

impl Error {
    /// Returns true if the command ran but its output was unusable.
    #[must_use]
    pub const fn is_output_error(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Decode(_))
    }
}
