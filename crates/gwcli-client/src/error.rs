//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the `gwcli` binary.
#[derive(Debug)]
pub enum ClientError {
    /// Failure from the credential, cache or sync layers.
    Core(gwcli_core::Error),
    /// Writing command output failed.
    Io(std::io::Error),
    /// The command line was well-formed but cannot be acted on.
    Usage(String),
}

impl ClientError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Usage(_) => None,
        }
    }
}

impl From<gwcli_core::Error> for ClientError {
    fn from(err: gwcli_core::Error) -> Self {
        Self::Core(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
