//! Proptest generators for property-based testing.

use proptest::prelude::*;

use walletgate_core::{
    Counterparty, IdentityKey, OriginatorDomain, ProtocolId, SecurityLevel,
};
use walletgate_tokens::{AccessRequest, PermissionRequest};

/// Generate a plausible originator domain.
pub fn originator() -> impl Strategy<Value = OriginatorDomain> {
    "[a-z][a-z0-9]{0,11}(\\.[a-z]{2,6}){1,2}"
        .prop_map(|s| OriginatorDomain::new(s).expect("generated domain is well-formed"))
}

/// Generate a valid, non-reserved protocol name.
pub fn protocol_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9]{2,8}", 1..4)
        .prop_map(|words| words.join(" "))
        .prop_filter("name shape", |name| {
            name.len() >= 5
                && !name.starts_with("admin")
                && !name.ends_with(" protocol")
        })
}

/// Generate a permissioned (non-open) security level.
pub fn security_level() -> impl Strategy<Value = SecurityLevel> {
    prop_oneof![Just(SecurityLevel::App), Just(SecurityLevel::Counterparty)]
}

/// Generate a random identity key.
pub fn identity_key() -> impl Strategy<Value = IdentityKey> {
    any::<[u8; 32]>().prop_map(|bytes| {
        IdentityKey::new(format!("02{}", hex::encode(bytes)))
            .expect("generated key is well-formed")
    })
}

/// Generate a counterparty.
pub fn counterparty() -> impl Strategy<Value = Counterparty> {
    prop_oneof![
        Just(Counterparty::SelfKey),
        Just(Counterparty::Anyone),
        identity_key().prop_map(Counterparty::Other),
    ]
}

/// Generate a kind-specific access payload.
pub fn access_request() -> impl Strategy<Value = AccessRequest> {
    prop_oneof![
        (security_level(), protocol_name(), counterparty()).prop_map(
            |(level, name, counterparty)| AccessRequest::Protocol {
                protocol_id: ProtocolId::new_unchecked(level, name),
                counterparty,
            }
        ),
        "[a-z][a-z0-9 _-]{0,20}"
            .prop_filter("non-reserved basket", |b| {
                !b.starts_with("admin") && b.as_str() != "default" && !b.ends_with(' ')
            })
            .prop_map(|basket| AccessRequest::Basket {
                basket: walletgate_core::BasketName::new_unchecked(basket),
            }),
        (
            identity_key(),
            "[a-z]{3,12}",
            prop::collection::vec("[a-z]{2,10}", 0..5)
        )
            .prop_map(|(verifier, cert_type, fields)| AccessRequest::Certificate {
                verifier,
                cert_type,
                fields,
            }),
        (1u64..10_000_000).prop_map(|satoshis| AccessRequest::Spending { satoshis }),
    ]
}

/// Generate a full permission request.
pub fn permission_request() -> impl Strategy<Value = PermissionRequest> {
    (originator(), access_request(), any::<bool>()).prop_map(|(origin, access, privileged)| {
        PermissionRequest::new(origin, access).with_privileged(privileged)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_resource_key_is_deterministic(request in permission_request()) {
            prop_assert_eq!(request.resource_key(), request.clone().resource_key());
        }

        #[test]
        fn test_resource_key_tracks_kind(request in permission_request()) {
            prop_assert_eq!(
                request.resource_key().permission_type,
                request.permission_type()
            );
        }

        #[test]
        fn test_privileged_splits_resource_keys(request in permission_request()) {
            let flipped = request.clone().with_privileged(!request.privileged);
            prop_assert_ne!(request.resource_key(), flipped.resource_key());
        }

        #[test]
        fn test_originator_splits_resource_keys(
            request in permission_request(),
            other in originator(),
        ) {
            prop_assume!(request.originator != other);
            let mut moved = request.clone();
            moved.originator = other;
            prop_assert_ne!(request.resource_key(), moved.resource_key());
        }
    }
}
