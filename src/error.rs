use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classification for failures reported by external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    NotFound,
    Validation,
    Location,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Location)
    }
}

/// Error shape every capability output carries back into the core.
///
/// The shell maps transport-level failures (HTTP status, socket errors,
/// permission denials) into this type; the core only ever branches on
/// `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{}] {message}", .kind.code())]
pub struct CollaboratorError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CollaboratorError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    #[must_use]
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "the request timed out")
    }

    #[must_use]
    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication, "no authenticated session")
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Location => {
                "Unable to determine your location. Please check your GPS settings.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::Network.code(), "NETWORK_ERROR");
        assert_eq!(ErrorKind::Authentication.code(), "AUTH_ERROR");
    }

    #[test]
    fn display_includes_code_and_message() {
        let error = CollaboratorError::network("connection refused");
        assert_eq!(error.to_string(), "[NETWORK_ERROR] connection refused");
    }

    #[test]
    fn retryability_follows_kind() {
        assert!(CollaboratorError::timeout().is_retryable());
        assert!(!CollaboratorError::authentication().is_retryable());
    }

    #[test]
    fn validation_message_passes_through() {
        let error = CollaboratorError::new(ErrorKind::Validation, "latitude out of range");
        assert_eq!(error.user_facing_message(), "latitude out of range");
    }
}
