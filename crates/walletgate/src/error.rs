//! Error types for the permissions manager.

use thiserror::Error;

use walletgate_core::WalletError;
use walletgate_tokens::TokenError;

use crate::pending::RequestId;

/// Errors that can occur during permission evaluation and resolution.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Consent was explicitly refused.
    #[error("permission denied: {0}")]
    Denied(String),

    /// A reserved protocol or basket name was used by a non-admin originator.
    #[error("admin-only violation: {0}")]
    AdminOnly(String),

    /// Malformed request arguments.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Grant or deny of an unknown or already-resolved request.
    #[error("unknown permission request: {0}")]
    UnknownRequest(RequestId),

    /// Failure from the underlying wallet, propagated unmodified.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Failure while building or parsing a permission token.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Broken internal invariant (e.g. the consent channel closed).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PermissionError> for WalletError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::Denied(msg) => WalletError::PermissionDenied(msg),
            PermissionError::AdminOnly(msg) => WalletError::AdminOnlyViolation(msg),
            PermissionError::InvalidRequest(msg) => WalletError::InvalidRequest(msg),
            PermissionError::UnknownRequest(id) => WalletError::UnknownRequest(id.to_string()),
            PermissionError::Wallet(inner) => inner,
            PermissionError::Token(inner) => inner.into(),
            PermissionError::Internal(msg) => WalletError::Underlying(msg),
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermissionError>;
