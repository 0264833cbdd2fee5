//! Configuration for the permissions manager.

use walletgate_core::SecurityLevel;

/// Default token lifetime: 30 days.
pub const DEFAULT_TOKEN_DURATION_SECS: i64 = 30 * 24 * 60 * 60;

/// Configuration for the [`WalletPermissionsManager`](crate::WalletPermissionsManager).
///
/// The seek flags gate whether a class of operation consults the permission
/// engine at all; with a flag off, the corresponding operations forward
/// straight to the underlying wallet.
#[derive(Debug, Clone)]
pub struct PermissionsConfig {
    /// Seek protocol permission for signature and HMAC operations.
    pub seek_protocol_permissions_for_signing: bool,
    /// Seek protocol permission for encryption, decryption, and derived keys.
    pub seek_protocol_permissions_for_encrypting: bool,
    /// Seek basket access for insertion, listing, and removal.
    pub seek_basket_insertion_permissions: bool,
    /// Seek certificate access for acquisition, listing, proving, relinquishing.
    pub seek_permissions_for_certificates: bool,
    /// Seek spending authorization for originator-funded actions.
    pub seek_permissions_for_spending: bool,
    /// Distinguish privileged from non-privileged requests. When false, the
    /// privileged flag is cleared before any lookup or prompt, so both forms
    /// share tokens and prompts.
    pub differentiate_privileged_operations: bool,
    /// Security level applied when a protocol is named without one.
    pub default_security_level: SecurityLevel,
    /// Lifetime of newly issued tokens (spending tokens are not time-limited).
    pub default_token_duration_secs: i64,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            seek_protocol_permissions_for_signing: true,
            seek_protocol_permissions_for_encrypting: true,
            seek_basket_insertion_permissions: true,
            seek_permissions_for_certificates: true,
            seek_permissions_for_spending: true,
            differentiate_privileged_operations: true,
            default_security_level: SecurityLevel::App,
            default_token_duration_secs: DEFAULT_TOKEN_DURATION_SECS,
        }
    }
}
