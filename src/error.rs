//! Error types for calls against the shortener API.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single collaborator call.
///
/// Every variant keeps the human-readable message from the response body
/// when the server sent one. The state machines reduce this to a plain
/// string with [`ApiError::message_or`]; nothing structured survives past
/// the owning slice's `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad credentials, or an invalid/expired token
    #[error("authentication error: {}", .message.as_deref().unwrap_or("unauthorized"))]
    Auth { message: Option<String> },

    /// Server unreachable or the request timed out
    #[error("network error: {0}")]
    Network(String),

    /// Input rejected, either locally or by the server
    #[error("validation error: {}", .message.as_deref().unwrap_or("invalid input"))]
    Validation { message: Option<String> },

    /// The addressed resource does not exist
    #[error("not found: {}", .message.as_deref().unwrap_or("no such resource"))]
    NotFound { message: Option<String> },

    /// Any other non-success status
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },

    /// Response body did not have the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a non-success HTTP status plus the body's message field.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth { message },
            404 => Self::NotFound { message },
            400 | 409 | 422 => Self::Validation { message },
            code => Self::Server {
                status: code,
                message,
            },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: Some(message.into()),
        }
    }

    /// The message the server supplied, if any.
    ///
    /// Transport and decode failures never carry a server message.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Auth { message }
            | Self::Validation { message }
            | Self::NotFound { message }
            | Self::Server { message, .. } => message.as_deref(),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// Reduce to the string stored in a slice's `error` field: the server's
    /// message when present, else the operation's fixed fallback.
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
