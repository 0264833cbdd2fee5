//! The underlying wallet interface.
//!
//! This trait is the capability set the permission engine both wraps and
//! consumes: every sensitive operation exposed to originators, plus the
//! encryption and transaction-construction capabilities the engine itself
//! uses to build and query permission tokens.
//!
//! Implementations must be thread-safe (Send + Sync). The permissions
//! manager implements this same trait over an inner implementation, so a
//! caller cannot tell a wrapped wallet from a bare one by its signature.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{
    BasketName, Counterparty, IdentityKey, OriginatorDomain, Outpoint, ProtocolId, Txid,
};

/// Protocol-scoped key addressing, shared by every key operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScope {
    /// The protocol governing the derived key.
    pub protocol_id: ProtocolId,
    /// The key identifier within the protocol.
    pub key_id: String,
    /// The counterparty the key is shared with.
    pub counterparty: Counterparty,
    /// Whether the privileged keyring is used.
    pub privileged: bool,
}

impl KeyScope {
    /// A scope over the wallet's own keys (counterparty self, unprivileged).
    pub fn self_scope(protocol_id: ProtocolId, key_id: impl Into<String>) -> Self {
        Self {
            protocol_id,
            key_id: key_id.into(),
            counterparty: Counterparty::SelfKey,
            privileged: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Key operation arguments
// ─────────────────────────────────────────────────────────────────────────

/// Arguments for `get_public_key`.
#[derive(Debug, Clone)]
pub struct GetPublicKeyArgs {
    /// Key scope; ignored when `identity_key` is set.
    pub scope: KeyScope,
    /// Request the wallet's root identity key instead of a derived key.
    pub identity_key: bool,
    /// Derive for the wallet itself rather than for the counterparty.
    pub for_self: bool,
}

/// Result of `get_public_key`.
#[derive(Debug, Clone)]
pub struct GetPublicKeyResult {
    /// The requested public key.
    pub public_key: IdentityKey,
}

/// Arguments for `encrypt`.
#[derive(Debug, Clone)]
pub struct EncryptArgs {
    pub scope: KeyScope,
    pub plaintext: Bytes,
}

/// Result of `encrypt`.
#[derive(Debug, Clone)]
pub struct EncryptResult {
    pub ciphertext: Bytes,
}

/// Arguments for `decrypt`.
#[derive(Debug, Clone)]
pub struct DecryptArgs {
    pub scope: KeyScope,
    pub ciphertext: Bytes,
}

/// Result of `decrypt`.
#[derive(Debug, Clone)]
pub struct DecryptResult {
    pub plaintext: Bytes,
}

/// Arguments for `create_hmac`.
#[derive(Debug, Clone)]
pub struct CreateHmacArgs {
    pub scope: KeyScope,
    pub data: Bytes,
}

/// Result of `create_hmac`.
#[derive(Debug, Clone)]
pub struct CreateHmacResult {
    pub hmac: Bytes,
}

/// Arguments for `verify_hmac`.
#[derive(Debug, Clone)]
pub struct VerifyHmacArgs {
    pub scope: KeyScope,
    pub data: Bytes,
    pub hmac: Bytes,
}

/// Result of `verify_hmac`.
#[derive(Debug, Clone)]
pub struct VerifyHmacResult {
    pub valid: bool,
}

/// Arguments for `create_signature`.
#[derive(Debug, Clone)]
pub struct CreateSignatureArgs {
    pub scope: KeyScope,
    pub data: Bytes,
}

/// Result of `create_signature`.
#[derive(Debug, Clone)]
pub struct CreateSignatureResult {
    pub signature: Bytes,
}

/// Arguments for `verify_signature`.
#[derive(Debug, Clone)]
pub struct VerifySignatureArgs {
    pub scope: KeyScope,
    pub data: Bytes,
    pub signature: Bytes,
}

/// Result of `verify_signature`.
#[derive(Debug, Clone)]
pub struct VerifySignatureResult {
    pub valid: bool,
}

// ─────────────────────────────────────────────────────────────────────────
// Action arguments
// ─────────────────────────────────────────────────────────────────────────

/// An input consumed by a new action.
#[derive(Debug, Clone)]
pub struct ActionInput {
    /// The output being spent.
    pub outpoint: Outpoint,
    /// Human description of why this input is consumed.
    pub input_description: String,
}

/// An output produced by a new action.
#[derive(Debug, Clone)]
pub struct ActionOutput {
    /// The locking script for the output.
    pub locking_script: Bytes,
    /// The amount locked into the output.
    pub satoshis: u64,
    /// Human description of the output.
    pub output_description: String,
    /// Basket to track the output under, if any.
    pub basket: Option<BasketName>,
    /// Tags applied to the output.
    pub tags: Vec<String>,
}

/// Arguments for `create_action`.
#[derive(Debug, Clone)]
pub struct CreateActionArgs {
    /// Human description of the action.
    pub description: String,
    /// Inputs the action must consume.
    pub inputs: Vec<ActionInput>,
    /// Outputs the action must produce.
    pub outputs: Vec<ActionOutput>,
    /// Labels applied to the action.
    pub labels: Vec<String>,
}

impl CreateActionArgs {
    /// Create an action with a description and no inputs, outputs, or labels.
    pub fn named(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Total satoshis locked into the action's outputs.
    pub fn total_output_satoshis(&self) -> u64 {
        self.outputs.iter().map(|o| o.satoshis).sum()
    }
}

/// Result of `create_action`.
#[derive(Debug, Clone)]
pub struct CreateActionResult {
    /// The transaction id of the created action.
    pub txid: Txid,
}

/// Arguments for `abort_action`.
#[derive(Debug, Clone)]
pub struct AbortActionArgs {
    /// Reference of the in-progress action to abort.
    pub reference: String,
}

/// Result of `abort_action`.
#[derive(Debug, Clone)]
pub struct AbortActionResult {
    pub aborted: bool,
}

/// How multiple labels or tags combine in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Match any of the given labels/tags.
    #[default]
    Any,
    /// Match all of the given labels/tags.
    All,
}

/// Arguments for `list_actions`.
#[derive(Debug, Clone)]
pub struct ListActionsArgs {
    /// Labels to filter by.
    pub labels: Vec<String>,
    /// How labels combine.
    pub label_query_mode: QueryMode,
    /// Maximum number of actions to return.
    pub limit: u32,
}

/// A summary of one wallet action.
#[derive(Debug, Clone)]
pub struct ActionSummary {
    pub txid: Txid,
    /// Net satoshi effect on the wallet (negative = spend).
    pub satoshis: i64,
    pub description: String,
    pub labels: Vec<String>,
    /// Unix seconds the action was created.
    pub created_at: i64,
}

/// Result of `list_actions`.
#[derive(Debug, Clone)]
pub struct ListActionsResult {
    pub total_actions: u32,
    pub actions: Vec<ActionSummary>,
}

/// How an internalized output is claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalizeProtocol {
    /// BRC-29 wallet payment.
    WalletPayment,
    /// Insertion into a basket.
    BasketInsertion,
}

/// One output claimed from an incoming transaction.
#[derive(Debug, Clone)]
pub struct InternalizeOutput {
    /// Index of the output within the transaction.
    pub output_index: u32,
    /// How the output is claimed.
    pub protocol: InternalizeProtocol,
    /// Target basket for basket insertions.
    pub basket: Option<BasketName>,
}

/// Arguments for `internalize_action`.
#[derive(Debug, Clone)]
pub struct InternalizeActionArgs {
    /// The raw transaction being internalized.
    pub tx: Bytes,
    /// Outputs of the transaction claimed by this wallet.
    pub outputs: Vec<InternalizeOutput>,
    /// Human description of the internalization.
    pub description: String,
}

/// Result of `internalize_action`.
#[derive(Debug, Clone)]
pub struct InternalizeActionResult {
    pub accepted: bool,
}

// ─────────────────────────────────────────────────────────────────────────
// Output arguments
// ─────────────────────────────────────────────────────────────────────────

/// Arguments for `list_outputs`.
#[derive(Debug, Clone)]
pub struct ListOutputsArgs {
    /// The basket to list.
    pub basket: BasketName,
    /// Tags to filter by.
    pub tags: Vec<String>,
    /// How tags combine.
    pub tag_query_mode: QueryMode,
    /// Include locking scripts in the results.
    pub include_locking_scripts: bool,
    /// Maximum number of outputs to return.
    pub limit: u32,
}

/// A spendable output tracked by the wallet.
#[derive(Debug, Clone)]
pub struct WalletOutput {
    pub outpoint: Outpoint,
    pub satoshis: u64,
    /// Present when `include_locking_scripts` was set.
    pub locking_script: Option<Bytes>,
    pub spendable: bool,
}

/// Result of `list_outputs`.
#[derive(Debug, Clone)]
pub struct ListOutputsResult {
    pub total_outputs: u32,
    pub outputs: Vec<WalletOutput>,
}

/// Arguments for `relinquish_output`.
#[derive(Debug, Clone)]
pub struct RelinquishOutputArgs {
    pub basket: BasketName,
    pub outpoint: Outpoint,
}

/// Result of `relinquish_output`.
#[derive(Debug, Clone)]
pub struct RelinquishOutputResult {
    pub relinquished: bool,
}

// ─────────────────────────────────────────────────────────────────────────
// Certificate arguments
// ─────────────────────────────────────────────────────────────────────────

/// An identity certificate held by the wallet.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub cert_type: String,
    pub serial_number: String,
    pub subject: IdentityKey,
    pub certifier: IdentityKey,
    /// Field name to field value.
    pub fields: BTreeMap<String, String>,
}

/// Arguments for `acquire_certificate`.
#[derive(Debug, Clone)]
pub struct AcquireCertificateArgs {
    pub cert_type: String,
    pub certifier: IdentityKey,
    pub fields: BTreeMap<String, String>,
    pub privileged: bool,
}

/// Arguments for `list_certificates`.
#[derive(Debug, Clone)]
pub struct ListCertificatesArgs {
    /// Restrict to these certifiers; empty = all.
    pub certifiers: Vec<IdentityKey>,
    /// Restrict to these types; empty = all.
    pub types: Vec<String>,
    pub privileged: bool,
    pub limit: u32,
}

/// Result of `list_certificates`.
#[derive(Debug, Clone)]
pub struct ListCertificatesResult {
    pub total_certificates: u32,
    pub certificates: Vec<Certificate>,
}

/// Arguments for `prove_certificate`.
#[derive(Debug, Clone)]
pub struct ProveCertificateArgs {
    /// The certificate to prove fields from.
    pub certificate: Certificate,
    /// Field names to reveal to the verifier.
    pub fields_to_reveal: Vec<String>,
    /// The verifier the keyring is prepared for.
    pub verifier: IdentityKey,
    pub privileged: bool,
}

/// Result of `prove_certificate`.
#[derive(Debug, Clone)]
pub struct ProveCertificateResult {
    /// Field name to decryption key, usable only by the verifier.
    pub keyring_for_verifier: BTreeMap<String, String>,
}

/// Arguments for `relinquish_certificate`.
#[derive(Debug, Clone)]
pub struct RelinquishCertificateArgs {
    pub cert_type: String,
    pub serial_number: String,
    pub certifier: IdentityKey,
}

/// Result of `relinquish_certificate`.
#[derive(Debug, Clone)]
pub struct RelinquishCertificateResult {
    pub relinquished: bool,
}

// ─────────────────────────────────────────────────────────────────────────
// Discovery arguments
// ─────────────────────────────────────────────────────────────────────────

/// Arguments for `discover_by_identity_key`.
#[derive(Debug, Clone)]
pub struct DiscoverByIdentityKeyArgs {
    pub identity_key: IdentityKey,
    pub limit: u32,
}

/// Arguments for `discover_by_attributes`.
#[derive(Debug, Clone)]
pub struct DiscoverByAttributesArgs {
    pub attributes: BTreeMap<String, String>,
    pub limit: u32,
}

/// Result of the discovery operations.
#[derive(Debug, Clone)]
pub struct DiscoverCertificatesResult {
    pub total_certificates: u32,
    pub certificates: Vec<Certificate>,
}

/// The wallet capability set.
///
/// `originator` identifies the calling application; `None` means the call
/// originates from the wallet's own machinery rather than an application.
#[async_trait]
pub trait WalletInterface: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────
    // Key Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Retrieve the identity key or a derived public key.
    async fn get_public_key(
        &self,
        args: GetPublicKeyArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<GetPublicKeyResult>;

    /// Encrypt data under a protocol-scoped key.
    async fn encrypt(
        &self,
        args: EncryptArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<EncryptResult>;

    /// Decrypt data under a protocol-scoped key.
    async fn decrypt(
        &self,
        args: DecryptArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<DecryptResult>;

    /// Create an HMAC under a protocol-scoped key.
    async fn create_hmac(
        &self,
        args: CreateHmacArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<CreateHmacResult>;

    /// Verify an HMAC under a protocol-scoped key.
    async fn verify_hmac(
        &self,
        args: VerifyHmacArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<VerifyHmacResult>;

    /// Create a signature under a protocol-scoped key.
    async fn create_signature(
        &self,
        args: CreateSignatureArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<CreateSignatureResult>;

    /// Verify a signature under a protocol-scoped key.
    async fn verify_signature(
        &self,
        args: VerifySignatureArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<VerifySignatureResult>;

    // ─────────────────────────────────────────────────────────────────────
    // Action Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Construct, sign, and broadcast a transaction.
    async fn create_action(
        &self,
        args: CreateActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<CreateActionResult>;

    /// Abort an in-progress action.
    async fn abort_action(
        &self,
        args: AbortActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<AbortActionResult>;

    /// List actions by label.
    async fn list_actions(
        &self,
        args: ListActionsArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ListActionsResult>;

    /// Claim outputs of an externally constructed transaction.
    async fn internalize_action(
        &self,
        args: InternalizeActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<InternalizeActionResult>;

    // ─────────────────────────────────────────────────────────────────────
    // Output Operations
    // ─────────────────────────────────────────────────────────────────────

    /// List outputs tracked in a basket.
    async fn list_outputs(
        &self,
        args: ListOutputsArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ListOutputsResult>;

    /// Stop tracking an output in a basket.
    async fn relinquish_output(
        &self,
        args: RelinquishOutputArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<RelinquishOutputResult>;

    // ─────────────────────────────────────────────────────────────────────
    // Certificate Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Acquire an identity certificate from a certifier.
    async fn acquire_certificate(
        &self,
        args: AcquireCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Certificate>;

    /// List held certificates.
    async fn list_certificates(
        &self,
        args: ListCertificatesArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ListCertificatesResult>;

    /// Prepare a field-revelation keyring for a verifier.
    async fn prove_certificate(
        &self,
        args: ProveCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<ProveCertificateResult>;

    /// Discard a held certificate.
    async fn relinquish_certificate(
        &self,
        args: RelinquishCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<RelinquishCertificateResult>;

    // ─────────────────────────────────────────────────────────────────────
    // Discovery Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Discover published certificates for an identity key.
    async fn discover_by_identity_key(
        &self,
        args: DiscoverByIdentityKeyArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<DiscoverCertificatesResult>;

    /// Discover published certificates by attribute values.
    async fn discover_by_attributes(
        &self,
        args: DiscoverByAttributesArgs,
        originator: Option<&OriginatorDomain>,
    ) -> Result<DiscoverCertificatesResult>;
}
