//! Error taxonomy shared by every gwcli crate.
//!
//! Errors are classified by [`ErrorKind`] so the CLI boundary can tell
//! "not authenticated yet" apart from "the disk is broken" or "the remote
//! API refused the request".

use std::fmt;
use thiserror::Error;

/// The category of a gwcli error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials are missing, invalid, expired without a refresh token,
    /// or the user supplied an empty authorization code.
    Authentication,
    /// A persisted file could not be read, written or decoded.
    Config,
    /// A caller-supplied parameter is outside its contract.
    Validation,
    /// A remote call failed for a reason other than authentication, or the
    /// local cache could not be written.
    Api,
}

impl ErrorKind {
    /// Returns a stable, lowercase name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Config => "config",
            Self::Validation => "validation",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by the credential lifecycle or the contact cache.
#[derive(Debug, Error)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    /// HTTP status of the failed remote call, when there was one.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Creates a configuration (I/O or decode) error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates an API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    /// Attaches the HTTP status code of the failed call.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if the error came from a remote call.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true for [`ErrorKind::Authentication`].
    pub fn is_authentication(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

/// A specialized Result type for gwcli operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(ErrorKind::Authentication.as_str(), "authentication");
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
        assert_eq!(ErrorKind::Api.as_str(), "api");
    }

    #[test]
    fn constructors_set_kind() {
        assert!(Error::authentication("x").is_authentication());
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(Error::api("x").kind(), ErrorKind::Api);
    }

    #[test]
    fn display_includes_kind_and_status() {
        let err = Error::api("quota exceeded").with_status(429);
        let display = err.to_string();
        assert_eq!(display, "api: quota exceeded (HTTP 429)");
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;
        let io_err = std::io::Error::other("disk full");
        let err = Error::config("failed to write token").with_source(io_err);
        assert!(err.source().is_some());
        assert!(!err.is_authentication());
    }
}
