//! Argument validation for the wallet surface.
//!
//! Malformed originator, protocol, basket, and certificate arguments fail
//! here with `InvalidRequest`, before any token lookup or consent round-trip.

use crate::error::{Result, WalletError};

/// Maximum length of an originator domain.
pub const MAX_ORIGINATOR_LEN: usize = 250;

/// Minimum and maximum length of a protocol name.
pub const MIN_PROTOCOL_NAME_LEN: usize = 5;
pub const MAX_PROTOCOL_NAME_LEN: usize = 400;

/// Maximum length of a basket name.
pub const MAX_BASKET_NAME_LEN: usize = 300;

/// Maximum length of a certificate type.
pub const MAX_CERT_TYPE_LEN: usize = 400;

/// Validate an originator domain: lowercase host shape, optionally with a port.
pub fn validate_originator(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(WalletError::InvalidRequest("originator must not be empty".into()));
    }
    if domain.len() > MAX_ORIGINATOR_LEN {
        return Err(WalletError::InvalidRequest(format!(
            "originator exceeds {MAX_ORIGINATOR_LEN} characters"
        )));
    }
    let ok = domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | ':'));
    if !ok {
        return Err(WalletError::InvalidRequest(format!(
            "originator contains invalid characters: {domain}"
        )));
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(WalletError::InvalidRequest(format!(
            "originator has leading or trailing dot: {domain}"
        )));
    }
    Ok(())
}

/// Validate a protocol name: letters, digits and single spaces, 5-400 chars,
/// no `" protocol"` suffix.
pub fn validate_protocol_name(name: &str) -> Result<()> {
    if name.len() < MIN_PROTOCOL_NAME_LEN || name.len() > MAX_PROTOCOL_NAME_LEN {
        return Err(WalletError::InvalidRequest(format!(
            "protocol name must be {MIN_PROTOCOL_NAME_LEN}-{MAX_PROTOCOL_NAME_LEN} characters"
        )));
    }
    let ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ');
    if !ok {
        return Err(WalletError::InvalidRequest(format!(
            "protocol name contains invalid characters: {name}"
        )));
    }
    if name.starts_with(' ') || name.ends_with(' ') || name.contains("  ") {
        return Err(WalletError::InvalidRequest(format!(
            "protocol name has malformed spacing: {name}"
        )));
    }
    if name.ends_with(" protocol") {
        return Err(WalletError::InvalidRequest(
            "protocol name must not end with \" protocol\"".into(),
        ));
    }
    Ok(())
}

/// Validate a basket name: lowercase, digits, spaces, dashes and underscores.
pub fn validate_basket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(WalletError::InvalidRequest("basket name must not be empty".into()));
    }
    if name.len() > MAX_BASKET_NAME_LEN {
        return Err(WalletError::InvalidRequest(format!(
            "basket name exceeds {MAX_BASKET_NAME_LEN} characters"
        )));
    }
    let ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, ' ' | '-' | '_'));
    if !ok {
        return Err(WalletError::InvalidRequest(format!(
            "basket name contains invalid characters: {name}"
        )));
    }
    Ok(())
}

/// Validate a certificate type string.
pub fn validate_certificate_type(cert_type: &str) -> Result<()> {
    if cert_type.is_empty() {
        return Err(WalletError::InvalidRequest("certificate type must not be empty".into()));
    }
    if cert_type.len() > MAX_CERT_TYPE_LEN {
        return Err(WalletError::InvalidRequest(format!(
            "certificate type exceeds {MAX_CERT_TYPE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a compressed identity key: 66 lowercase hex chars, 02/03 prefix.
pub fn validate_identity_key(hex: &str) -> Result<()> {
    if hex.len() != 66 {
        return Err(WalletError::InvalidRequest(format!(
            "identity key must be 66 hex characters, got {}",
            hex.len()
        )));
    }
    if !hex.starts_with("02") && !hex.starts_with("03") {
        return Err(WalletError::InvalidRequest(
            "identity key must start with 02 or 03".into(),
        ));
    }
    if !hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) {
        return Err(WalletError::InvalidRequest(
            "identity key must be lowercase hex".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_originator_shapes() {
        assert!(validate_originator("example.com").is_ok());
        assert!(validate_originator("localhost:3000").is_ok());
        assert!(validate_originator("sub.app-name.example.com").is_ok());
        assert!(validate_originator("").is_err());
        assert!(validate_originator("Example.com").is_err());
        assert!(validate_originator(".example.com").is_err());
        assert!(validate_originator("has space.com").is_err());
    }

    #[test]
    fn test_protocol_names() {
        assert!(validate_protocol_name("document signing").is_ok());
        assert!(validate_protocol_name("todo list").is_ok());
        assert!(validate_protocol_name("abc").is_err()); // too short
        assert!(validate_protocol_name("double  space").is_err());
        assert!(validate_protocol_name(" leading").is_err());
        assert!(validate_protocol_name("my own protocol").is_err());
        assert!(validate_protocol_name("Uppercase Name").is_err());
    }

    #[test]
    fn test_basket_names() {
        assert!(validate_basket_name("todo tokens").is_ok());
        assert!(validate_basket_name("my-basket_2").is_ok());
        assert!(validate_basket_name("").is_err());
        assert!(validate_basket_name("Shouty").is_err());
    }

    #[test]
    fn test_identity_keys() {
        assert!(validate_identity_key(&format!("02{}", "ab".repeat(32))).is_ok());
        assert!(validate_identity_key(&format!("03{}", "0f".repeat(32))).is_ok());
        assert!(validate_identity_key(&format!("04{}", "ab".repeat(32))).is_err());
        assert!(validate_identity_key("02abcd").is_err());
        assert!(validate_identity_key(&format!("02{}", "AB".repeat(32))).is_err());
    }
}
