//! Caller-facing result payloads.

use serde::{Deserialize, Serialize};

use crate::error::{DevcellError, ErrorKind};

/// Error payload reported in place of a success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable classification.
    pub kind: ErrorKind,
}

impl From<&DevcellError> for ErrorPayload {
    fn from(error: &DevcellError) -> Self {
        Self {
            error: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// The result of one public operation: its payload, or `{error, kind}`.
///
/// Serializes untagged, so a success is indistinguishable from the bare
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    /// The operation's payload.
    Success(T),
    /// The operation failed.
    Failure(ErrorPayload),
}

impl<T> Outcome<T> {
    /// Convert a library result.
    #[must_use]
    pub fn from_result(result: Result<T, DevcellError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(ErrorPayload::from(&error)),
        }
    }

    /// Return true for a success payload.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Return the success payload, if any.
    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Return the error payload, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Success(_) => None,
            Self::Failure(payload) => Some(payload),
        }
    }

    /// Return the error kind, if this is a failure.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(payload) => Some(payload.kind),
        }
    }
}
