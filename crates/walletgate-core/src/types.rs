//! Strong type definitions for the wallet surface.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WalletError;
use crate::validation;

/// A 32-byte transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    /// Create a new Txid from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(s)
            .map_err(|e| WalletError::InvalidRequest(format!("bad txid hex: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| WalletError::InvalidRequest("txid must be 32 bytes".into()))?;
        Ok(Self(arr))
    }

    /// The zero txid (used as a sentinel).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Txid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Txid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A spendable transaction output location: `<txid>.<vout>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    /// The transaction containing the output.
    pub txid: Txid,
    /// The output index within the transaction.
    pub vout: u32,
}

impl Outpoint {
    /// Create a new outpoint.
    pub const fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.txid.to_hex(), self.vout)
    }
}

impl FromStr for Outpoint {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, vout) = s
            .rsplit_once('.')
            .ok_or_else(|| WalletError::InvalidRequest(format!("bad outpoint: {s}")))?;
        Ok(Self {
            txid: Txid::from_hex(txid)?,
            vout: vout
                .parse()
                .map_err(|_| WalletError::InvalidRequest(format!("bad output index: {vout}")))?,
        })
    }
}

/// A compressed public key identifying a counterparty, verifier, or certifier.
///
/// Stored as its 66-character lowercase hex form (33 bytes, `02`/`03` prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Create from a hex string, validating shape.
    pub fn new(hex: impl Into<String>) -> Result<Self, WalletError> {
        let hex = hex.into();
        validation::validate_identity_key(&hex)?;
        Ok(Self(hex))
    }

    /// Get the hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the raw key bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        hex::decode(&self.0).expect("validated on construction")
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The party a protocol-scoped key is shared with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counterparty {
    /// The wallet's own identity.
    SelfKey,
    /// Any counterparty (public usage).
    Anyone,
    /// A specific counterparty identity key.
    Other(IdentityKey),
}

impl Counterparty {
    /// Parse from the wire form: `self`, `anyone`, or a compressed key hex.
    pub fn parse(s: &str) -> Result<Self, WalletError> {
        match s {
            "self" => Ok(Self::SelfKey),
            "anyone" => Ok(Self::Anyone),
            other => Ok(Self::Other(IdentityKey::new(other)?)),
        }
    }
}

impl fmt::Display for Counterparty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfKey => write!(f, "self"),
            Self::Anyone => write!(f, "anyone"),
            Self::Other(key) => write!(f, "{key}"),
        }
    }
}

/// BRC-43 security level of a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SecurityLevel {
    /// Open usage: no permission required.
    Open = 0,
    /// Per-application permission.
    App = 1,
    /// Per-application, per-counterparty permission.
    Counterparty = 2,
}

impl SecurityLevel {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Open),
            1 => Some(Self::App),
            2 => Some(Self::Counterparty),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u8())
    }
}

/// A protocol identifier: security level plus protocol name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolId {
    /// The security level governing permission checks.
    pub security_level: SecurityLevel,
    /// The protocol name.
    pub name: String,
}

impl ProtocolId {
    /// Create a new protocol id, validating the name.
    pub fn new(security_level: SecurityLevel, name: impl Into<String>) -> Result<Self, WalletError> {
        let name = name.into();
        validation::validate_protocol_name(&name)?;
        Ok(Self {
            security_level,
            name,
        })
    }

    /// Create without validation. For protocol ids owned by the engine itself.
    pub fn new_unchecked(security_level: SecurityLevel, name: impl Into<String>) -> Self {
        Self {
            security_level,
            name: name.into(),
        }
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.security_level, self.name)
    }
}

/// A web-origin or application identifier for a calling application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginatorDomain(String);

impl OriginatorDomain {
    /// Create from a domain string, validating shape.
    pub fn new(domain: impl Into<String>) -> Result<Self, WalletError> {
        let domain = domain.into();
        validation::validate_originator(&domain)?;
        Ok(Self(domain))
    }

    /// Get the domain string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginatorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named output basket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasketName(String);

impl BasketName {
    /// Create from a basket name, validating shape.
    pub fn new(name: impl Into<String>) -> Result<Self, WalletError> {
        let name = name.into();
        validation::validate_basket_name(&name)?;
        Ok(Self(name))
    }

    /// Create without validation. For baskets owned by the engine itself.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the basket name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BasketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
