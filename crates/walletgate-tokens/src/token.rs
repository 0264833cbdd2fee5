//! On-chain permission tokens.
//!
//! A token is a single spendable output in one of the `permissions_*`
//! baskets whose locking script carries the encrypted grant fields. Tokens
//! cache a prior consent decision: while a valid token exists, the matching
//! requests proceed without a prompt.

use serde::{Deserialize, Serialize};
use std::fmt;

use walletgate_core::{BasketName, Counterparty, IdentityKey, OriginatorDomain, Outpoint, ProtocolId};

use crate::request::{AccessRequest, PermissionRequest, PermissionType};

/// Expiry value meaning "not time-limited" (used by spending tokens).
pub const NO_EXPIRY: i64 = 0;

/// The decrypted kind-specific payload of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenPayload {
    /// Protocol access (DPACP).
    Protocol {
        privileged: bool,
        protocol_id: ProtocolId,
        counterparty: Counterparty,
    },
    /// Basket access (DBAP).
    Basket { basket: BasketName },
    /// Certificate field disclosure (DCAP).
    Certificate {
        privileged: bool,
        cert_type: String,
        fields: Vec<String>,
        verifier: IdentityKey,
    },
    /// Spending authorization (DSAP).
    Spending { authorized_amount: u64 },
}

impl TokenPayload {
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

/// A validated on-chain permission grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionToken {
    /// The spendable location of the token output.
    pub outpoint: Outpoint,
    /// Satoshis locked in the token output.
    pub satoshis: u64,
    /// The originator the grant applies to.
    pub originator: OriginatorDomain,
    /// Expiry in Unix seconds; [`NO_EXPIRY`] means not time-limited.
    pub expiry: i64,
    /// The decrypted kind-specific grant.
    pub payload: TokenPayload,
}

impl PermissionToken {
    /// The permission kind of this token.
    pub fn permission_type(&self) -> PermissionType {
        self.payload.permission_type()
    }

    /// Check whether the token has expired at `now` (Unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry != NO_EXPIRY && now > self.expiry
    }

    /// Check whether this token satisfies the given request's resource
    /// identity.
    ///
    /// Expiry is not considered here; an expired-but-matching token is what
    /// turns a request into a renewal.
    pub fn matches(&self, request: &PermissionRequest) -> bool {
        if self.originator != request.originator {
            return false;
        }
        match (&self.payload, &request.access) {
            (
                TokenPayload::Protocol {
                    privileged,
                    protocol_id,
                    counterparty,
                },
                AccessRequest::Protocol {
                    protocol_id: req_protocol,
                    counterparty: req_counterparty,
                },
            ) => {
                *privileged == request.privileged
                    && protocol_id == req_protocol
                    && counterparty == req_counterparty
            }
            (TokenPayload::Basket { basket }, AccessRequest::Basket { basket: req_basket }) => {
                basket == req_basket
            }
            (
                TokenPayload::Certificate {
                    privileged,
                    cert_type,
                    fields,
                    verifier,
                },
                AccessRequest::Certificate {
                    verifier: req_verifier,
                    cert_type: req_type,
                    fields: req_fields,
                },
            ) => {
                // A token only satisfies a request whose field set is a
                // subset of the granted fields.
                *privileged == request.privileged
                    && cert_type == req_type
                    && verifier == req_verifier
                    && req_fields.iter().all(|f| fields.contains(f))
            }
            (TokenPayload::Spending { .. }, AccessRequest::Spending { .. }) => true,
            _ => false,
        }
    }

    /// The authorized amount of a spending token, if this is one.
    pub fn authorized_amount(&self) -> Option<u64> {
        match &self.payload {
            TokenPayload::Spending { authorized_amount } => Some(*authorized_amount),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} token for {} at {}",
            self.permission_type(),
            self.originator,
            self.outpoint,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AccessRequest;
    use walletgate_core::{SecurityLevel, Txid};

    fn originator() -> OriginatorDomain {
        OriginatorDomain::new("app.example.com").unwrap()
    }

    fn protocol_token(expiry: i64) -> PermissionToken {
        PermissionToken {
            outpoint: Outpoint::new(Txid::from_bytes([1; 32]), 0),
            satoshis: 1,
            originator: originator(),
            expiry,
            payload: TokenPayload::Protocol {
                privileged: false,
                protocol_id: ProtocolId::new(SecurityLevel::App, "todo list").unwrap(),
                counterparty: Counterparty::SelfKey,
            },
        }
    }

    #[test]
    fn test_expiry() {
        let token = protocol_token(1000);
        assert!(!token.is_expired(500));
        assert!(!token.is_expired(1000));
        assert!(token.is_expired(1001));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let token = protocol_token(NO_EXPIRY);
        assert!(!token.is_expired(i64::MAX));
    }

    #[test]
    fn test_protocol_match() {
        let token = protocol_token(1000);
        let request = PermissionRequest::new(
            originator(),
            AccessRequest::Protocol {
                protocol_id: ProtocolId::new(SecurityLevel::App, "todo list").unwrap(),
                counterparty: Counterparty::SelfKey,
            },
        );
        assert!(token.matches(&request));
        assert!(!token.matches(&request.clone().with_privileged(true)));

        let other_origin = PermissionRequest::new(
            OriginatorDomain::new("other.example.com").unwrap(),
            request.access.clone(),
        );
        assert!(!token.matches(&other_origin));
    }

    #[test]
    fn test_certificate_field_subset() {
        let verifier = IdentityKey::new(format!("02{}", "ab".repeat(32))).unwrap();
        let token = PermissionToken {
            outpoint: Outpoint::new(Txid::from_bytes([2; 32]), 1),
            satoshis: 1,
            originator: originator(),
            expiry: NO_EXPIRY,
            payload: TokenPayload::Certificate {
                privileged: false,
                cert_type: "identity".into(),
                fields: vec!["name".into(), "email".into()],
                verifier: verifier.clone(),
            },
        };

        let subset = PermissionRequest::new(
            originator(),
            AccessRequest::Certificate {
                verifier: verifier.clone(),
                cert_type: "identity".into(),
                fields: vec!["name".into()],
            },
        );
        assert!(token.matches(&subset));

        let superset = PermissionRequest::new(
            originator(),
            AccessRequest::Certificate {
                verifier,
                cert_type: "identity".into(),
                fields: vec!["name".into(), "phone".into()],
            },
        );
        assert!(!token.matches(&superset));
    }

    #[test]
    fn test_kind_mismatch_never_matches() {
        let token = protocol_token(NO_EXPIRY);
        let spending =
            PermissionRequest::new(originator(), AccessRequest::Spending { satoshis: 42 });
        assert!(!token.matches(&spending));
    }
}
