//! Permission requests and their deduplication keys.
//!
//! A request is tagged by the kind of access sought. Each kind carries only
//! its relevant payload, so a basket request cannot smuggle protocol fields
//! and vice versa.

use serde::{Deserialize, Serialize};
use std::fmt;

use walletgate_core::{BasketName, Counterparty, IdentityKey, OriginatorDomain, ProtocolId};

use crate::token::PermissionToken;

/// The four permission token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionType {
    /// Domain Protocol Access Control Protocol.
    Protocol,
    /// Domain Basket Access Protocol.
    Basket,
    /// Domain Certificate Access Protocol.
    Certificate,
    /// Domain Spending Authorization Protocol.
    Spending,
}

impl PermissionType {
    /// The on-chain tag marking outputs of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Protocol => "DPACP",
            Self::Basket => "DBAP",
            Self::Certificate => "DCAP",
            Self::Spending => "DSAP",
        }
    }

    /// The basket tracking tokens of this kind.
    pub fn basket(&self) -> BasketName {
        BasketName::new_unchecked(match self {
            Self::Protocol => "permissions_DPACP",
            Self::Basket => "permissions_DBAP",
            Self::Certificate => "permissions_DCAP",
            Self::Spending => "permissions_DSAP",
        })
    }

    /// Number of encrypted fields in a token of this kind.
    pub fn field_count(&self) -> usize {
        match self {
            Self::Protocol => 6,
            Self::Basket => 3,
            Self::Certificate => 6,
            Self::Spending => 2,
        }
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// The kind-specific payload of a permission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessRequest {
    /// Access to a protocol, per counterparty.
    Protocol {
        protocol_id: ProtocolId,
        counterparty: Counterparty,
    },
    /// Access to an output basket.
    Basket { basket: BasketName },
    /// Disclosure of certificate fields to a verifier.
    Certificate {
        verifier: IdentityKey,
        cert_type: String,
        fields: Vec<String>,
    },
    /// Authorization to spend wallet funds.
    Spending { satoshis: u64 },
}

impl AccessRequest {
    /// The permission kind of this payload.
    pub fn permission_type(&self) -> PermissionType {
        match self {
            Self::Protocol { .. } => PermissionType::Protocol,
            Self::Basket { .. } => PermissionType::Basket,
            Self::Certificate { .. } => PermissionType::Certificate,
            Self::Spending { .. } => PermissionType::Spending,
        }
    }
}

/// A request for originator consent.
///
/// `renewal` is set when a previous token exists but no longer satisfies the
/// request (expired, or exhausted for spending); `previous_token` then holds
/// the token being superseded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// The application asking for access.
    pub originator: OriginatorDomain,
    /// Whether the privileged keyring is involved.
    pub privileged: bool,
    /// Human-readable reason shown to the user.
    pub reason: Option<String>,
    /// True when this request renews a previous token.
    pub renewal: bool,
    /// The token being renewed, present iff `renewal`.
    pub previous_token: Option<PermissionToken>,
    /// The kind-specific payload.
    pub access: AccessRequest,
}

impl PermissionRequest {
    /// Create a fresh (non-renewal, unprivileged) request.
    pub fn new(originator: OriginatorDomain, access: AccessRequest) -> Self {
        Self {
            originator,
            privileged: false,
            reason: None,
            renewal: false,
            previous_token: None,
            access,
        }
    }

    /// Set the privileged flag.
    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Set the human-readable reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Turn this request into a renewal of the given token.
    pub fn into_renewal(mut self, previous: PermissionToken) -> Self {
        self.renewal = true;
        self.previous_token = Some(previous);
        self
    }

    /// The permission kind of this request.
    pub fn permission_type(&self) -> PermissionType {
        self.access.permission_type()
    }

    /// The deduplication key for this request.
    ///
    /// Two concurrent requests with equal keys share one consent prompt and
    /// one decision.
    pub fn resource_key(&self) -> ResourceKey {
        let (identity, counterparty) = match &self.access {
            AccessRequest::Protocol {
                protocol_id,
                counterparty,
            } => (protocol_id.to_string(), counterparty.to_string()),
            AccessRequest::Basket { basket } => (basket.to_string(), String::new()),
            AccessRequest::Certificate {
                verifier,
                cert_type,
                ..
            } => (cert_type.clone(), verifier.to_string()),
            // One spending authorization per originator.
            AccessRequest::Spending { .. } => (String::new(), String::new()),
        };
        ResourceKey {
            permission_type: self.permission_type(),
            originator: self.originator.to_string(),
            identity,
            counterparty,
            privileged: self.privileged,
        }
    }
}

/// The logical resource a request asks access to.
///
/// At most one pending consent decision exists per key at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub permission_type: PermissionType,
    pub originator: String,
    pub identity: String,
    pub counterparty: String,
    pub privileged: bool,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.permission_type,
            self.originator,
            self.identity,
            self.counterparty,
            if self.privileged { "priv" } else { "std" },
        )
    }
}
