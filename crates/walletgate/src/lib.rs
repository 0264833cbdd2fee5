//! # Walletgate
//!
//! Wallet permissioning middleware for BRC-100-style wallets.
//!
//! ## Overview
//!
//! [`WalletPermissionsManager`] sits between untrusted calling applications
//! ("originators") and an underlying wallet, enforcing per-origin,
//! per-operation consent before sensitive capabilities are exercised. It
//! implements the same [`WalletInterface`](walletgate_core::WalletInterface)
//! as the wallet it wraps, so embedding it is transparent to callers.
//!
//! ## Key Concepts
//!
//! - **Evaluation**: each wrapped operation decides between proceeding
//!   immediately (open usage, admin originator, gated-off, or a valid
//!   cached token), failing fast (reserved names, malformed arguments), or
//!   seeking consent.
//! - **Coalescing**: concurrent asks for the same logical resource share a
//!   single consent prompt and receive the identical decision.
//! - **Tokens**: a non-ephemeral grant is cached as an on-chain permission
//!   token; renewal spends the old token and creates its replacement in one
//!   transaction.
//! - **Callbacks**: applications bind [`PermissionHandler`]s that surface
//!   prompts to the user and resolve them with
//!   [`grant_permission`](WalletPermissionsManager::grant_permission) /
//!   [`deny_permission`](WalletPermissionsManager::deny_permission).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use walletgate::{
//!     handler_fn, GrantOptions, PermissionEvent, PermissionsConfig,
//!     WalletPermissionsManager,
//! };
//! use walletgate_core::OriginatorDomain;
//!
//! # fn demo(underlying: Arc<dyn walletgate_core::WalletInterface>) -> anyhow::Result<()> {
//! let manager = WalletPermissionsManager::new(
//!     underlying,
//!     OriginatorDomain::new("admin.walletvendor.com")?,
//!     PermissionsConfig::default(),
//! );
//!
//! manager.bind_callback(
//!     PermissionEvent::ProtocolPermissionRequested,
//!     handler_fn(|prompt| async move {
//!         println!("consent wanted: {:?}", prompt.request);
//!         Ok(())
//!     }),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod pending;
pub mod store;

pub use config::{PermissionsConfig, DEFAULT_TOKEN_DURATION_SECS};
pub use error::{PermissionError, Result};
pub use events::{
    handler_fn, CallbackHandle, PermissionEvent, PermissionHandler, PermissionPrompt,
};
pub use manager::{
    BasketUsage, GrantOptions, ProtocolUsage, WalletPermissionsManager, ADMIN_RESERVED_PREFIX,
    DEFAULT_BASKET,
};
pub use pending::{Decision, RequestId};
pub use store::{originator_label, TokenStore};
