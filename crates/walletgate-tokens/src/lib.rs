//! # Walletgate Tokens
//!
//! Permission requests, on-chain permission tokens, and the token codec.
//!
//! ## Overview
//!
//! Consent decisions are cached on-chain as permission tokens: single
//! spendable outputs in a per-kind basket whose locking scripts carry the
//! encrypted grant fields.
//!
//! ## Key Concepts
//!
//! - **PermissionRequest**: one ask, tagged by kind (protocol, basket,
//!   certificate, spending) with a kind-specific payload
//! - **ResourceKey**: the deduplication key; concurrent requests with equal
//!   keys share one consent prompt
//! - **PermissionToken**: a decrypted, validated on-chain grant
//! - **Codec**: the fixed per-kind encrypted field layout (6/3/6/2 fields)
//!   and the push-drop locking script that carries it
//!
//! ## Token Model
//!
//! Renewal spends the old token and creates its replacement in one
//! transaction, so at most one live token exists per resource at any time.
//! Revocation spends the token without a replacement.

pub mod codec;
pub mod error;
pub mod request;
pub mod script;
pub mod token;

pub use codec::{build_fields, parse_token, token_encryption_scope, TOKEN_ENCRYPTION_PROTOCOL};
pub use error::{Result, TokenError};
pub use request::{AccessRequest, PermissionRequest, PermissionType, ResourceKey};
pub use script::{build_token_script, parse_token_script};
pub use token::{PermissionToken, TokenPayload, NO_EXPIRY};
