//! Encrypted token field codec.
//!
//! Each token kind has a fixed ordered field layout. Every field is
//! independently encrypted through the wallet's own encryption capability,
//! scoped to the permission system's protocol, so only the token owner can
//! read a grant back off the chain.
//!
//! | Kind | Fields |
//! |---|---|
//! | DPACP | domain, expiry, privileged, security level, protocol name, counterparty |
//! | DBAP | domain, expiry, basket |
//! | DCAP | domain, expiry, privileged, cert type, fields JSON, verifier |
//! | DSAP | domain, authorized amount |

use bytes::Bytes;

use walletgate_core::{
    Counterparty, DecryptArgs, EncryptArgs, IdentityKey, KeyScope, OriginatorDomain, Outpoint,
    ProtocolId, SecurityLevel, WalletInterface,
};

use crate::error::{Result, TokenError};
use crate::request::{AccessRequest, PermissionRequest, PermissionType};
use crate::token::{PermissionToken, TokenPayload, NO_EXPIRY};

/// The protocol under which token fields are encrypted.
pub const TOKEN_ENCRYPTION_PROTOCOL: &str = "admin permission token encryption";

/// The key scope used for token field encryption: counterparty self, key `1`.
pub fn token_encryption_scope() -> KeyScope {
    KeyScope::self_scope(
        ProtocolId::new_unchecked(SecurityLevel::Counterparty, TOKEN_ENCRYPTION_PROTOCOL),
        "1",
    )
}

/// Encrypt one field value.
async fn encrypt_field(wallet: &dyn WalletInterface, value: &str) -> Result<Bytes> {
    let result = wallet
        .encrypt(
            EncryptArgs {
                scope: token_encryption_scope(),
                plaintext: Bytes::copy_from_slice(value.as_bytes()),
            },
            None,
        )
        .await?;
    Ok(result.ciphertext)
}

/// Decrypt one field value back to its string form.
async fn decrypt_field(wallet: &dyn WalletInterface, ciphertext: &Bytes) -> Result<String> {
    let result = wallet
        .decrypt(
            DecryptArgs {
                scope: token_encryption_scope(),
                ciphertext: ciphertext.clone(),
            },
            None,
        )
        .await?;
    String::from_utf8(result.plaintext.to_vec())
        .map_err(|_| TokenError::Malformed("token field is not valid UTF-8".into()))
}

/// Build the ordered encrypted fields for a token of the request's kind.
///
/// `amount` is the authorized amount for spending tokens and ignored for
/// every other kind. Spending tokens are not time-limited; their layout
/// carries no expiry.
pub async fn build_fields(
    wallet: &dyn WalletInterface,
    request: &PermissionRequest,
    expiry: i64,
    amount: Option<u64>,
) -> Result<Vec<Bytes>> {
    let domain = request.originator.to_string();
    let plaintexts: Vec<String> = match &request.access {
        AccessRequest::Protocol {
            protocol_id,
            counterparty,
        } => vec![
            domain,
            expiry.to_string(),
            request.privileged.to_string(),
            protocol_id.security_level.to_string(),
            protocol_id.name.clone(),
            counterparty.to_string(),
        ],
        AccessRequest::Basket { basket } => vec![domain, expiry.to_string(), basket.to_string()],
        AccessRequest::Certificate {
            verifier,
            cert_type,
            fields,
        } => vec![
            domain,
            expiry.to_string(),
            request.privileged.to_string(),
            cert_type.clone(),
            serde_json::to_string(fields)
                .map_err(|e| TokenError::Malformed(format!("fields json: {e}")))?,
            verifier.to_string(),
        ],
        AccessRequest::Spending { satoshis } => {
            vec![domain, amount.unwrap_or(*satoshis).to_string()]
        }
    };

    let mut encrypted = Vec::with_capacity(plaintexts.len());
    for value in &plaintexts {
        encrypted.push(encrypt_field(wallet, value).await?);
    }
    debug_assert_eq!(encrypted.len(), request.permission_type().field_count());
    Ok(encrypted)
}

/// Decrypt and decode a token output's fields into a [`PermissionToken`].
pub async fn parse_token(
    wallet: &dyn WalletInterface,
    permission_type: PermissionType,
    outpoint: Outpoint,
    satoshis: u64,
    fields: &[Bytes],
) -> Result<PermissionToken> {
    if fields.len() != permission_type.field_count() {
        return Err(TokenError::Malformed(format!(
            "{permission_type} token has {} fields, expected {}",
            fields.len(),
            permission_type.field_count()
        )));
    }

    let mut decrypted = Vec::with_capacity(fields.len());
    for field in fields {
        decrypted.push(decrypt_field(wallet, field).await?);
    }

    let originator = OriginatorDomain::new(decrypted[0].clone())
        .map_err(|e| TokenError::Malformed(format!("token domain: {e}")))?;

    let (expiry, payload) = match permission_type {
        PermissionType::Protocol => {
            let level = parse_security_level(&decrypted[3])?;
            (
                parse_expiry(&decrypted[1])?,
                TokenPayload::Protocol {
                    privileged: parse_bool(&decrypted[2])?,
                    protocol_id: ProtocolId::new_unchecked(level, decrypted[4].clone()),
                    counterparty: Counterparty::parse(&decrypted[5])
                        .map_err(|e| TokenError::Malformed(format!("counterparty: {e}")))?,
                },
            )
        }
        PermissionType::Basket => (
            parse_expiry(&decrypted[1])?,
            TokenPayload::Basket {
                basket: walletgate_core::BasketName::new_unchecked(decrypted[2].clone()),
            },
        ),
        PermissionType::Certificate => (
            parse_expiry(&decrypted[1])?,
            TokenPayload::Certificate {
                privileged: parse_bool(&decrypted[2])?,
                cert_type: decrypted[3].clone(),
                fields: serde_json::from_str(&decrypted[4])
                    .map_err(|e| TokenError::Malformed(format!("fields json: {e}")))?,
                verifier: IdentityKey::new(decrypted[5].clone())
                    .map_err(|e| TokenError::Malformed(format!("verifier: {e}")))?,
            },
        ),
        PermissionType::Spending => (
            NO_EXPIRY,
            TokenPayload::Spending {
                authorized_amount: decrypted[1]
                    .parse()
                    .map_err(|_| TokenError::Malformed("bad authorized amount".into()))?,
            },
        ),
    };

    Ok(PermissionToken {
        outpoint,
        satoshis,
        originator,
        expiry,
        payload,
    })
}

fn parse_expiry(s: &str) -> Result<i64> {
    s.parse()
        .map_err(|_| TokenError::Malformed(format!("bad expiry: {s}")))
}

fn parse_bool(s: &str) -> Result<bool> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(TokenError::Malformed(format!("bad boolean: {other}"))),
    }
}

fn parse_security_level(s: &str) -> Result<SecurityLevel> {
    s.parse::<u8>()
        .ok()
        .and_then(SecurityLevel::from_u8)
        .ok_or_else(|| TokenError::Malformed(format!("bad security level: {s}")))
}
