//! Token locking script layout.
//!
//! A token output locks to the wallet's own key and carries the encrypted
//! grant fields as data pushes: the owner key and `OP_CHECKSIG`, followed by
//! one push per field, followed by the drops that clear them off the stack.
//! The layout is deterministic, so `parse` recovers exactly the field
//! buffers `build` was given.

use bytes::Bytes;

use walletgate_core::IdentityKey;

use crate::error::{Result, TokenError};

const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_2DROP: u8 = 0x6d;
const OP_DROP: u8 = 0x75;
const OP_CHECKSIG: u8 = 0xac;

/// Build a token locking script from the owner key and encrypted fields.
pub fn build_token_script(owner: &IdentityKey, fields: &[Bytes]) -> Bytes {
    let mut buf = Vec::with_capacity(
        35 + fields.iter().map(|f| f.len() + 5).sum::<usize>() + fields.len(),
    );
    push_data(&mut buf, &owner.to_bytes());
    buf.push(OP_CHECKSIG);
    for field in fields {
        push_data(&mut buf, field);
    }
    // Clear the field pushes: one OP_2DROP per pair, OP_DROP for a remainder.
    for _ in 0..fields.len() / 2 {
        buf.push(OP_2DROP);
    }
    if fields.len() % 2 == 1 {
        buf.push(OP_DROP);
    }
    Bytes::from(buf)
}

/// Parse a token locking script back into its encrypted fields.
///
/// The owner key push and `OP_CHECKSIG` prefix are validated and skipped;
/// the returned buffers are the field pushes in order.
pub fn parse_token_script(script: &[u8]) -> Result<Vec<Bytes>> {
    let mut pos = 0;

    let owner = read_push(script, &mut pos)?
        .ok_or_else(|| TokenError::Script("missing owner key push".into()))?;
    if owner.len() != 33 {
        return Err(TokenError::Script(format!(
            "owner key push must be 33 bytes, got {}",
            owner.len()
        )));
    }
    if script.get(pos) != Some(&OP_CHECKSIG) {
        return Err(TokenError::Script("expected OP_CHECKSIG after owner key".into()));
    }
    pos += 1;

    let mut fields = Vec::new();
    while pos < script.len() {
        match read_push(script, &mut pos)? {
            Some(field) => fields.push(Bytes::from(field)),
            None => break, // drop section reached
        }
    }

    // Everything after the pushes must be drops matching the field count.
    let mut drops = 0;
    while pos < script.len() {
        match script[pos] {
            OP_2DROP => drops += 2,
            OP_DROP => drops += 1,
            other => {
                return Err(TokenError::Script(format!(
                    "unexpected opcode 0x{other:02x} in drop section"
                )))
            }
        }
        pos += 1;
    }
    if drops != fields.len() {
        return Err(TokenError::Script(format!(
            "{} fields but {drops} dropped",
            fields.len()
        )));
    }

    Ok(fields)
}

/// Append a minimal data push for `data`.
fn push_data(buf: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        len @ 0..=75 => buf.push(len as u8),
        len @ 76..=255 => {
            buf.push(OP_PUSHDATA1);
            buf.push(len as u8);
        }
        len @ 256..=65535 => {
            buf.push(OP_PUSHDATA2);
            buf.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            buf.push(OP_PUSHDATA4);
            buf.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    buf.extend_from_slice(data);
}

/// Read one data push at `pos`, advancing it. Returns `None` (without
/// advancing) when the next opcode is not a push.
fn read_push(script: &[u8], pos: &mut usize) -> Result<Option<Vec<u8>>> {
    let Some(&opcode) = script.get(*pos) else {
        return Ok(None);
    };
    let (len, header) = match opcode {
        0..=75 => (opcode as usize, 1),
        OP_PUSHDATA1 => {
            let len = *script
                .get(*pos + 1)
                .ok_or_else(|| TokenError::Script("truncated OP_PUSHDATA1".into()))?;
            (len as usize, 2)
        }
        OP_PUSHDATA2 => {
            let bytes: [u8; 2] = script
                .get(*pos + 1..*pos + 3)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| TokenError::Script("truncated OP_PUSHDATA2".into()))?;
            (u16::from_le_bytes(bytes) as usize, 3)
        }
        OP_PUSHDATA4 => {
            let bytes: [u8; 4] = script
                .get(*pos + 1..*pos + 5)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| TokenError::Script("truncated OP_PUSHDATA4".into()))?;
            (u32::from_le_bytes(bytes) as usize, 5)
        }
        _ => return Ok(None),
    };
    let start = *pos + header;
    let data = script
        .get(start..start + len)
        .ok_or_else(|| TokenError::Script("push extends past script end".into()))?;
    *pos = start + len;
    Ok(Some(data.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owner() -> IdentityKey {
        IdentityKey::new(format!("02{}", "ab".repeat(32))).unwrap()
    }

    #[test]
    fn test_roundtrip_even_field_count() {
        let fields: Vec<Bytes> = vec![
            Bytes::from_static(b"alpha"),
            Bytes::from_static(b"beta"),
        ];
        let script = build_token_script(&owner(), &fields);
        assert_eq!(parse_token_script(&script).unwrap(), fields);
    }

    #[test]
    fn test_roundtrip_odd_field_count() {
        let fields: Vec<Bytes> = vec![
            Bytes::from_static(b"a"),
            Bytes::from_static(b"bb"),
            Bytes::from_static(b"ccc"),
        ];
        let script = build_token_script(&owner(), &fields);
        assert_eq!(parse_token_script(&script).unwrap(), fields);
    }

    #[test]
    fn test_large_field_uses_pushdata() {
        let fields = vec![Bytes::from(vec![0x41; 300])];
        let script = build_token_script(&owner(), &fields);
        assert_eq!(parse_token_script(&script).unwrap(), fields);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_token_script(&[0xff, 0x00]).is_err());
        assert!(parse_token_script(&[]).is_err());
    }

    #[test]
    fn test_rejects_wrong_drop_count() {
        let fields = vec![Bytes::from_static(b"x"), Bytes::from_static(b"y")];
        let mut script = build_token_script(&owner(), &fields).to_vec();
        script.push(OP_DROP); // one drop too many
        assert!(parse_token_script(&script).is_err());
    }

    proptest! {
        #[test]
        fn test_roundtrip_arbitrary_fields(
            raw in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..400), 0..8)
        ) {
            let fields: Vec<Bytes> = raw.into_iter().map(Bytes::from).collect();
            let script = build_token_script(&owner(), &fields);
            prop_assert_eq!(parse_token_script(&script).unwrap(), fields);
        }
    }
}
