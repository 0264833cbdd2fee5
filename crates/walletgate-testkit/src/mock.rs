//! An in-memory wallet implementing the full capability set.
//!
//! The mock records every call so tests can assert which operations reached
//! the underlying wallet. Its self-encryption is real (ChaCha20-Poly1305
//! under a key derived from the protocol scope), so the token codec
//! round-trips through it exactly as it would through a production wallet,
//! and created outputs are tracked per basket so `list_outputs` reflects
//! prior `create_action` calls.

use bytes::Bytes;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use std::sync::Mutex;

use async_trait::async_trait;
use walletgate_core::{
    AbortActionArgs, AbortActionResult, AcquireCertificateArgs, ActionSummary, Certificate,
    CreateActionArgs, CreateActionResult, CreateHmacArgs, CreateHmacResult, CreateSignatureArgs,
    CreateSignatureResult, DecryptArgs, DecryptResult, DiscoverByAttributesArgs,
    DiscoverByIdentityKeyArgs, DiscoverCertificatesResult, EncryptArgs, EncryptResult,
    GetPublicKeyArgs, GetPublicKeyResult, IdentityKey, InternalizeActionArgs,
    InternalizeActionResult, KeyScope, ListActionsArgs, ListActionsResult, ListCertificatesArgs,
    ListCertificatesResult, ListOutputsArgs, ListOutputsResult, OriginatorDomain, Outpoint,
    ProveCertificateArgs, ProveCertificateResult, QueryMode, RelinquishCertificateArgs,
    RelinquishCertificateResult, RelinquishOutputArgs, RelinquishOutputResult, Result, Txid,
    VerifyHmacArgs, VerifyHmacResult, VerifySignatureArgs, VerifySignatureResult, WalletError,
    WalletInterface, WalletOutput,
};

/// One recorded call into the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Method name, e.g. `"create_action"`.
    pub method: &'static str,
    /// The originator the call carried, if any.
    pub originator: Option<String>,
}

#[derive(Debug, Clone)]
struct MockOutput {
    basket: String,
    outpoint: Outpoint,
    satoshis: u64,
    script: Bytes,
    tags: Vec<String>,
    spendable: bool,
}

#[derive(Default)]
struct MockState {
    calls: Vec<CallRecord>,
    created_actions: Vec<CreateActionArgs>,
    outputs: Vec<MockOutput>,
    actions: Vec<ActionSummary>,
    certificates: Vec<Certificate>,
    next_tx: u64,
}

/// An in-memory wallet for tests.
pub struct MockWallet {
    secret: [u8; 32],
    state: Mutex<MockState>,
}

impl MockWallet {
    /// Create with a random root secret.
    pub fn new() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::from_seed(secret)
    }

    /// Create with a deterministic root secret.
    pub fn from_seed(secret: [u8; 32]) -> Self {
        Self {
            secret,
            state: Mutex::new(MockState::default()),
        }
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().expect("mock state poisoned").calls.clone()
    }

    /// Number of recorded calls to `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    /// Full arguments of every `create_action` call, in order.
    pub fn created_actions(&self) -> Vec<CreateActionArgs> {
        self.state
            .lock()
            .expect("mock state poisoned")
            .created_actions
            .clone()
    }

    /// The wallet's identity key.
    pub fn identity_key(&self) -> IdentityKey {
        let hash = blake3::hash(&self.secret);
        IdentityKey::new(format!("02{}", hex::encode(hash.as_bytes())))
            .expect("derived key is well-formed")
    }

    /// Backdate a recorded action so spending-tally windows can be tested.
    pub fn backdate_action(&self, txid: Txid, created_at: i64) {
        let mut state = self.state.lock().expect("mock state poisoned");
        for action in &mut state.actions {
            if action.txid == txid {
                action.created_at = created_at;
            }
        }
    }

    fn record(&self, method: &'static str, originator: Option<&OriginatorDomain>) {
        self.state
            .lock()
            .expect("mock state poisoned")
            .calls
            .push(CallRecord {
                method,
                originator: originator.map(|o| o.to_string()),
            });
    }

    /// Derive the symmetric key for a protocol scope.
    fn scope_key(&self, scope: &KeyScope) -> chacha20poly1305::Key {
        let mut hasher = blake3::Hasher::new_derive_key("walletgate-testkit self encryption");
        hasher.update(&self.secret);
        hasher.update(&[scope.protocol_id.security_level.to_u8()]);
        hasher.update(scope.protocol_id.name.as_bytes());
        hasher.update(scope.key_id.as_bytes());
        hasher.update(scope.counterparty.to_string().as_bytes());
        hasher.update(&[scope.privileged as u8]);
        (*hasher.finalize().as_bytes()).into()
    }

    fn keyed_digest(&self, context: &str, scope: &KeyScope, data: &[u8]) -> Bytes {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        hasher.update(self.scope_key(scope).as_slice());
        hasher.update(data);
        Bytes::copy_from_slice(hasher.finalize().as_bytes())
    }

    fn next_txid(&self, state: &mut MockState) -> Txid {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.secret);
        hasher.update(&state.next_tx.to_le_bytes());
        state.next_tx += 1;
        Txid::from_bytes(*hasher.finalize().as_bytes())
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

fn tags_match(mode: QueryMode, wanted: &[String], present: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    match mode {
        QueryMode::Any => wanted.iter().any(|t| present.contains(t)),
        QueryMode::All => wanted.iter().all(|t| present.contains(t)),
    }
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

#[async_trait]
impl WalletInterface for MockWallet {
    async fn get_public_key(
        &self,
        args: GetPublicKeyArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<GetPublicKeyResult> {
        self.record("get_public_key", originator);
        let public_key = if args.identity_key {
            self.identity_key()
        } else {
            let digest = self.keyed_digest("walletgate-testkit derived key", &args.scope, &[]);
            IdentityKey::new(format!("03{}", hex::encode(&digest[..])))
                .expect("derived key is well-formed")
        };
        Ok(GetPublicKeyResult { public_key })
    }

    async fn encrypt(
        &self,
        args: EncryptArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<EncryptResult> {
        self.record("encrypt", originator);
        let cipher = ChaCha20Poly1305::new(&self.scope_key(&args.scope));
        let mut nonce = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), args.plaintext.as_ref())
            .map_err(|e| WalletError::Encryption(e.to_string()))?;
        let mut out = nonce.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(EncryptResult {
            ciphertext: Bytes::from(out),
        })
    }

    async fn decrypt(
        &self,
        args: DecryptArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<DecryptResult> {
        self.record("decrypt", originator);
        if args.ciphertext.len() < 12 {
            return Err(WalletError::Decryption("ciphertext too short".into()));
        }
        let (nonce, ciphertext) = args.ciphertext.split_at(12);
        let cipher = ChaCha20Poly1305::new(&self.scope_key(&args.scope));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| WalletError::Decryption(e.to_string()))?;
        Ok(DecryptResult {
            plaintext: Bytes::from(plaintext),
        })
    }

    async fn create_hmac(
        &self,
        args: CreateHmacArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<CreateHmacResult> {
        self.record("create_hmac", originator);
        Ok(CreateHmacResult {
            hmac: self.keyed_digest("walletgate-testkit hmac", &args.scope, &args.data),
        })
    }

    async fn verify_hmac(
        &self,
        args: VerifyHmacArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<VerifyHmacResult> {
        self.record("verify_hmac", originator);
        let expected = self.keyed_digest("walletgate-testkit hmac", &args.scope, &args.data);
        Ok(VerifyHmacResult {
            valid: expected == args.hmac,
        })
    }

    async fn create_signature(
        &self,
        args: CreateSignatureArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<CreateSignatureResult> {
        self.record("create_signature", originator);
        Ok(CreateSignatureResult {
            signature: self.keyed_digest("walletgate-testkit signature", &args.scope, &args.data),
        })
    }

    async fn verify_signature(
        &self,
        args: VerifySignatureArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<VerifySignatureResult> {
        self.record("verify_signature", originator);
        let expected =
            self.keyed_digest("walletgate-testkit signature", &args.scope, &args.data);
        Ok(VerifySignatureResult {
            valid: expected == args.signature,
        })
    }

    async fn create_action(
        &self,
        args: CreateActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<CreateActionResult> {
        self.record("create_action", originator);
        let mut state = self.state.lock().expect("mock state poisoned");
        let txid = self.next_txid(&mut state);

        for input in &args.inputs {
            state.outputs.retain(|o| o.outpoint != input.outpoint);
        }
        for (index, output) in args.outputs.iter().enumerate() {
            if let Some(basket) = &output.basket {
                state.outputs.push(MockOutput {
                    basket: basket.to_string(),
                    outpoint: Outpoint::new(txid, index as u32),
                    satoshis: output.satoshis,
                    script: output.locking_script.clone(),
                    tags: output.tags.clone(),
                    spendable: true,
                });
            }
        }

        state.actions.push(ActionSummary {
            txid,
            satoshis: -(args.total_output_satoshis() as i64),
            description: args.description.clone(),
            labels: args.labels.clone(),
            created_at: now_secs(),
        });
        state.created_actions.push(args);

        Ok(CreateActionResult { txid })
    }

    async fn abort_action(
        &self,
        _args: AbortActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<AbortActionResult> {
        self.record("abort_action", originator);
        Ok(AbortActionResult { aborted: true })
    }

    async fn list_actions(
        &self,
        args: ListActionsArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ListActionsResult> {
        self.record("list_actions", originator);
        let state = self.state.lock().expect("mock state poisoned");
        let actions: Vec<ActionSummary> = state
            .actions
            .iter()
            .filter(|a| tags_match(args.label_query_mode, &args.labels, &a.labels))
            .take(args.limit as usize)
            .cloned()
            .collect();
        Ok(ListActionsResult {
            total_actions: actions.len() as u32,
            actions,
        })
    }

    async fn internalize_action(
        &self,
        _args: InternalizeActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<InternalizeActionResult> {
        self.record("internalize_action", originator);
        Ok(InternalizeActionResult { accepted: true })
    }

    async fn list_outputs(
        &self,
        args: ListOutputsArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ListOutputsResult> {
        self.record("list_outputs", originator);
        let state = self.state.lock().expect("mock state poisoned");
        let outputs: Vec<WalletOutput> = state
            .outputs
            .iter()
            .filter(|o| {
                o.basket == args.basket.as_str()
                    && tags_match(args.tag_query_mode, &args.tags, &o.tags)
            })
            .take(args.limit as usize)
            .map(|o| WalletOutput {
                outpoint: o.outpoint,
                satoshis: o.satoshis,
                locking_script: args.include_locking_scripts.then(|| o.script.clone()),
                spendable: o.spendable,
            })
            .collect();
        Ok(ListOutputsResult {
            total_outputs: outputs.len() as u32,
            outputs,
        })
    }

    async fn relinquish_output(
        &self,
        args: RelinquishOutputArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<RelinquishOutputResult> {
        self.record("relinquish_output", originator);
        let mut state = self.state.lock().expect("mock state poisoned");
        let before = state.outputs.len();
        state
            .outputs
            .retain(|o| !(o.basket == args.basket.as_str() && o.outpoint == args.outpoint));
        Ok(RelinquishOutputResult {
            relinquished: state.outputs.len() < before,
        })
    }

    async fn acquire_certificate(
        &self,
        args: AcquireCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Certificate> {
        self.record("acquire_certificate", originator);
        let mut state = self.state.lock().expect("mock state poisoned");
        let serial = self.next_txid(&mut state).to_hex();
        let certificate = Certificate {
            cert_type: args.cert_type,
            serial_number: serial,
            subject: self.identity_key(),
            certifier: args.certifier,
            fields: args.fields,
        };
        state.certificates.push(certificate.clone());
        Ok(certificate)
    }

    async fn list_certificates(
        &self,
        args: ListCertificatesArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ListCertificatesResult> {
        self.record("list_certificates", originator);
        let state = self.state.lock().expect("mock state poisoned");
        let certificates: Vec<Certificate> = state
            .certificates
            .iter()
            .filter(|c| args.certifiers.is_empty() || args.certifiers.contains(&c.certifier))
            .filter(|c| args.types.is_empty() || args.types.contains(&c.cert_type))
            .take(args.limit as usize)
            .cloned()
            .collect();
        Ok(ListCertificatesResult {
            total_certificates: certificates.len() as u32,
            certificates,
        })
    }

    async fn prove_certificate(
        &self,
        args: ProveCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ProveCertificateResult> {
        self.record("prove_certificate", originator);
        let keyring = args
            .fields_to_reveal
            .iter()
            .map(|field| (field.clone(), format!("keyring-{field}")))
            .collect();
        Ok(ProveCertificateResult {
            keyring_for_verifier: keyring,
        })
    }

    async fn relinquish_certificate(
        &self,
        args: RelinquishCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<RelinquishCertificateResult> {
        self.record("relinquish_certificate", originator);
        let mut state = self.state.lock().expect("mock state poisoned");
        let before = state.certificates.len();
        state.certificates.retain(|c| {
            !(c.cert_type == args.cert_type
                && c.serial_number == args.serial_number
                && c.certifier == args.certifier)
        });
        Ok(RelinquishCertificateResult {
            relinquished: state.certificates.len() < before,
        })
    }

    async fn discover_by_identity_key(
        &self,
        args: DiscoverByIdentityKeyArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<DiscoverCertificatesResult> {
        self.record("discover_by_identity_key", originator);
        let state = self.state.lock().expect("mock state poisoned");
        let certificates: Vec<Certificate> = state
            .certificates
            .iter()
            .filter(|c| c.subject == args.identity_key)
            .take(args.limit as usize)
            .cloned()
            .collect();
        Ok(DiscoverCertificatesResult {
            total_certificates: certificates.len() as u32,
            certificates,
        })
    }

    async fn discover_by_attributes(
        &self,
        args: DiscoverByAttributesArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<DiscoverCertificatesResult> {
        self.record("discover_by_attributes", originator);
        let state = self.state.lock().expect("mock state poisoned");
        let certificates: Vec<Certificate> = state
            .certificates
            .iter()
            .filter(|c| {
                args.attributes
                    .iter()
                    .all(|(k, v)| c.fields.get(k) == Some(v))
            })
            .take(args.limit as usize)
            .cloned()
            .collect();
        Ok(DiscoverCertificatesResult {
            total_certificates: certificates.len() as u32,
            certificates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletgate_core::ProtocolId;
    use walletgate_core::SecurityLevel;

    fn scope() -> KeyScope {
        KeyScope::self_scope(
            ProtocolId::new_unchecked(SecurityLevel::Counterparty, "unit test scope"),
            "1",
        )
    }

    #[tokio::test]
    async fn test_encrypt_decrypt_roundtrip() {
        let wallet = MockWallet::from_seed([7; 32]);
        let encrypted = wallet
            .encrypt(
                EncryptArgs {
                    scope: scope(),
                    plaintext: Bytes::from_static(b"hello"),
                },
                None,
            )
            .await
            .unwrap();
        let decrypted = wallet
            .decrypt(
                DecryptArgs {
                    scope: scope(),
                    ciphertext: encrypted.ciphertext,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(decrypted.plaintext, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_wrong_scope_fails_decrypt() {
        let wallet = MockWallet::from_seed([7; 32]);
        let encrypted = wallet
            .encrypt(
                EncryptArgs {
                    scope: scope(),
                    plaintext: Bytes::from_static(b"secret"),
                },
                None,
            )
            .await
            .unwrap();
        let mut other = scope();
        other.key_id = "2".into();
        let result = wallet
            .decrypt(
                DecryptArgs {
                    scope: other,
                    ciphertext: encrypted.ciphertext,
                },
                None,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_action_tracks_basket_outputs() {
        use walletgate_core::{ActionOutput, BasketName};

        let wallet = MockWallet::from_seed([1; 32]);
        let mut args = CreateActionArgs::named("test");
        args.outputs.push(ActionOutput {
            locking_script: Bytes::from_static(b"\x00"),
            satoshis: 9,
            output_description: "tracked".into(),
            basket: Some(BasketName::new_unchecked("stash")),
            tags: vec!["tagged".into()],
        });
        let created = wallet.create_action(args, None).await.unwrap();

        let listed = wallet
            .list_outputs(
                ListOutputsArgs {
                    basket: BasketName::new_unchecked("stash"),
                    tags: vec!["tagged".into()],
                    tag_query_mode: QueryMode::All,
                    include_locking_scripts: true,
                    limit: 10,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(listed.outputs.len(), 1);
        assert_eq!(listed.outputs[0].outpoint, Outpoint::new(created.txid, 0));
        assert_eq!(listed.outputs[0].satoshis, 9);
    }

    #[tokio::test]
    async fn test_inputs_consume_outputs() {
        use walletgate_core::{ActionInput, ActionOutput, BasketName};

        let wallet = MockWallet::from_seed([2; 32]);
        let mut args = CreateActionArgs::named("create");
        args.outputs.push(ActionOutput {
            locking_script: Bytes::new(),
            satoshis: 1,
            output_description: "victim".into(),
            basket: Some(BasketName::new_unchecked("stash")),
            tags: vec![],
        });
        let created = wallet.create_action(args, None).await.unwrap();

        let mut spend = CreateActionArgs::named("spend");
        spend.inputs.push(ActionInput {
            outpoint: Outpoint::new(created.txid, 0),
            input_description: "consume".into(),
        });
        wallet.create_action(spend, None).await.unwrap();

        let listed = wallet
            .list_outputs(
                ListOutputsArgs {
                    basket: BasketName::new_unchecked("stash"),
                    tags: vec![],
                    tag_query_mode: QueryMode::Any,
                    include_locking_scripts: false,
                    limit: 10,
                },
                None,
            )
            .await
            .unwrap();
        assert!(listed.outputs.is_empty());
    }

    #[test]
    fn test_deterministic_identity() {
        let a = MockWallet::from_seed([3; 32]);
        let b = MockWallet::from_seed([3; 32]);
        assert_eq!(a.identity_key(), b.identity_key());
    }
}
