//! Error types for the token module.

use thiserror::Error;
use walletgate_core::WalletError;

/// Errors that can occur while building or parsing permission tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// A token output's field layout could not be decoded.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// A token locking script could not be parsed.
    #[error("bad token script: {0}")]
    Script(String),

    /// Wallet error during field encryption or decryption.
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
}

impl From<TokenError> for WalletError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Wallet(inner) => inner,
            other => WalletError::InvalidToken(other.to_string()),
        }
    }
}

/// Result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;
