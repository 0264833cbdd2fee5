//! Error types for the wallet surface.
//!
//! Every failure category a caller can observe through the wallet interface
//! is a distinct variant. Permission failures are never collapsed into a
//! generic error: a denied consent, a reserved-name violation, and a
//! malformed argument each surface separately.

use thiserror::Error;

/// Errors that can occur on the wallet surface.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Consent was explicitly refused. Not retried.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A reserved protocol or basket name was used by a non-admin originator.
    #[error("admin-only violation: {0}")]
    AdminOnlyViolation(String),

    /// Malformed protocol, basket, certificate, or originator arguments.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Resolution of an unknown or already-resolved permission request.
    #[error("unknown permission request: {0}")]
    UnknownRequest(String),

    /// Encryption failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption failed.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// A permission token output could not be decoded.
    #[error("invalid permission token: {0}")]
    InvalidToken(String),

    /// Any other failure from the underlying wallet, propagated unmodified.
    #[error("underlying wallet error: {0}")]
    Underlying(String),
}

/// Result type for wallet operations.
pub type Result<T> = std::result::Result<T, WalletError>;
