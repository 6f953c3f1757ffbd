//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur while building or resolving an account.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL has no host, so it cannot describe an account.
    #[error("URL has no host")]
    MissingHost,

    /// The location string is not a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL scheme does not name a supported protocol.
    #[error("Unknown URL scheme: {0}")]
    UnknownScheme(String),

    /// A value had to be prompted for, but prompting is disabled.
    #[error("Cannot prompt for {0} in non-interactive mode")]
    NotInteractive(&'static str),

    /// The prompt was cancelled or returned nothing usable.
    #[error("Prompt for {0} failed")]
    PromptFailed(&'static str),

    /// No OAuth refresh command is configured for the protocol.
    #[error("No OAUTH refresh command defined for {0}")]
    NoRefreshCommand(&'static str),

    /// The OAuth refresh command could not be started.
    #[error(transparent)]
    SpawnFailed(mailacct_oauth::Error),

    /// The OAuth refresh command ran, but its output could not be read.
    #[error(transparent)]
    RefreshOutput(mailacct_oauth::Error),

    /// The OAuth refresh command printed nothing.
    #[error("Refresh command returned empty string")]
    EmptyRefreshToken,

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<mailacct_oauth::Error> for Error {
    fn from(err: mailacct_oauth::Error) -> Self {
        if err.is_output_error() {
            Self::RefreshOutput(err)
        } else {
            Self::SpawnFailed(err)
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
