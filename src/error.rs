//! Error types for the WSAA client.
//!
//! This module defines all error kinds that can occur while issuing or
//! serving access tickets: input validation, credential loading, transport,
//! endpoint rejections, and response parsing.

use thiserror::Error;

/// Result type alias using [`WsaaError`].
pub type Result<T> = std::result::Result<T, WsaaError>;

/// Errors that can occur during WSAA client operations.
#[derive(Debug, Error)]
pub enum WsaaError {
    /// Bad input to request construction or configuration.
    ///
    /// Never retried; the caller must fix the input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Certificate or private key could not be read or used for signing.
    ///
    /// Fatal: a bad key will never sign successfully, so this is never
    /// retried automatically.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Network failure or timeout reaching the authentication endpoint.
    ///
    /// Callers may retry at a higher layer; a single `get_ticket` call
    /// never retries the exchange on its own.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint explicitly refused the login request (SOAP fault).
    ///
    /// Carries the fault detail verbatim, e.g. a ticket already issued for
    /// an overlapping window.
    #[error("Login rejected by endpoint ({code}): {message}")]
    RemoteRejection {
        /// Fault code reported by the endpoint.
        code: String,
        /// Fault text reported by the endpoint.
        message: String,
    },

    /// Response could not be parsed into the expected shape.
    ///
    /// Indicates contract drift on the endpoint side.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A cache entry could not be deserialized.
    ///
    /// The cache read path absorbs this (logs and treats the entry as
    /// absent); it never escapes the public API.
    #[error("Cache entry corrupted: {0}")]
    CacheCorruption(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WsaaError {
    /// Create a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a credential error with the given message.
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a remote rejection from a fault code and fault text.
    pub fn remote_rejection(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteRejection {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error with the given message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a cache corruption error with the given message.
    pub fn cache_corruption(msg: impl Into<String>) -> Self {
        Self::CacheCorruption(msg.into())
    }

    /// Returns true if this is a retryable error.
    ///
    /// Only transport failures are worth retrying: validation and credential
    /// errors need operator intervention, and a rejection or protocol
    /// mismatch will repeat until the request or the endpoint changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the fault code if this is a remote rejection.
    pub fn fault_code(&self) -> Option<&str> {
        match self {
            Self::RemoteRejection { code, .. } => Some(code),
            _ => None,
        }
    }
}
