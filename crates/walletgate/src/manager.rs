//! The permissions manager: unified wallet surface with consent enforcement.
//!
//! [`WalletPermissionsManager`] implements [`WalletInterface`] over an inner
//! wallet. Every sensitive operation is wrapped with "evaluate, then proceed
//! or seek consent, then delegate"; the inner wallet is never reached when
//! evaluation fails.

use std::sync::{Arc, Mutex};

use walletgate_core::{
    validation, AbortActionArgs, AbortActionResult, AcquireCertificateArgs, BasketName,
    Certificate, Counterparty, CreateActionArgs, CreateActionResult, CreateHmacArgs,
    CreateHmacResult, CreateSignatureArgs, CreateSignatureResult, DecryptArgs, DecryptResult,
    DiscoverByAttributesArgs, DiscoverByIdentityKeyArgs, DiscoverCertificatesResult, EncryptArgs,
    EncryptResult, GetPublicKeyArgs, GetPublicKeyResult, IdentityKey, InternalizeActionArgs,
    InternalizeActionResult, InternalizeProtocol, KeyScope, ListActionsArgs, ListActionsResult,
    ListCertificatesArgs, ListCertificatesResult, ListOutputsArgs, ListOutputsResult,
    OriginatorDomain, ProtocolId, ProveCertificateArgs, ProveCertificateResult,
    RelinquishCertificateArgs, RelinquishCertificateResult, RelinquishOutputArgs,
    RelinquishOutputResult, SecurityLevel, Txid, VerifyHmacArgs, VerifyHmacResult,
    VerifySignatureArgs, VerifySignatureResult, WalletError, WalletInterface,
};
use walletgate_tokens::{
    AccessRequest, PermissionRequest, PermissionToken, PermissionType, NO_EXPIRY,
};

use crate::config::PermissionsConfig;
use crate::error::{PermissionError, Result};
use crate::events::{CallbackHandle, CallbackRegistry, PermissionEvent, PermissionHandler, PermissionPrompt};
use crate::pending::{Decision, PendingRequests, RequestId};
use crate::store::{month_start, now_secs, originator_label, TokenStore};

/// Names beginning with this marker are reserved for the admin originator.
pub const ADMIN_RESERVED_PREFIX: &str = "admin";

/// The basket every wallet carries; never accessible to originators.
pub const DEFAULT_BASKET: &str = "default";

/// What a protocol permission is sought for, selecting the gating seek flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolUsage {
    /// Signature and HMAC operations.
    Signing,
    /// Encryption, decryption, and derived key retrieval.
    Encrypting,
    /// Anything else; always seeks permission.
    Generic,
}

/// What basket access is sought for. All usages share one seek flag and one
/// token; the usage refines prompt wording only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasketUsage {
    Insertion,
    Removal,
    Listing,
}

impl BasketUsage {
    fn verb(self) -> &'static str {
        match self {
            Self::Insertion => "insert into",
            Self::Removal => "remove from",
            Self::Listing => "list",
        }
    }
}

/// Options for granting an outstanding permission request.
#[derive(Debug, Clone, Default)]
pub struct GrantOptions {
    /// Grant this ask only; no token is persisted.
    pub ephemeral: bool,
    /// Token expiry override (Unix seconds). Defaults to the configured
    /// token duration. Ignored for spending tokens, which do not expire.
    pub expiry: Option<i64>,
    /// Authorized amount override for spending tokens. Defaults to the
    /// requested amount.
    pub amount: Option<u64>,
}

impl GrantOptions {
    /// Grant for this ask only, persisting nothing.
    pub fn ephemeral() -> Self {
        Self {
            ephemeral: true,
            ..Self::default()
        }
    }
}

/// Wallet permissioning middleware.
///
/// Sits between untrusted originators and an underlying wallet, enforcing
/// per-origin, per-operation consent. Prior consent is cached as on-chain
/// permission tokens; concurrent identical asks share a single prompt.
pub struct WalletPermissionsManager {
    underlying: Arc<dyn WalletInterface>,
    admin_originator: OriginatorDomain,
    config: PermissionsConfig,
    callbacks: Mutex<CallbackRegistry>,
    pending: PendingRequests,
    tokens: TokenStore,
}

impl WalletPermissionsManager {
    /// Create a manager over an underlying wallet.
    ///
    /// `admin_originator` is the one origin exempt from admin-reserved-name
    /// checks and permission seeking.
    pub fn new(
        underlying: Arc<dyn WalletInterface>,
        admin_originator: OriginatorDomain,
        config: PermissionsConfig,
    ) -> Self {
        Self {
            tokens: TokenStore::new(Arc::clone(&underlying)),
            underlying,
            admin_originator,
            config,
            callbacks: Mutex::new(CallbackRegistry::new()),
            pending: PendingRequests::new(),
        }
    }

    /// The configured admin originator.
    pub fn admin_originator(&self) -> &OriginatorDomain {
        &self.admin_originator
    }

    /// Build a protocol id at the configured default security level.
    pub fn protocol_id(&self, name: impl Into<String>) -> Result<ProtocolId> {
        Ok(ProtocolId::new(self.config.default_security_level, name)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Callback Surface
    // ─────────────────────────────────────────────────────────────────────

    /// Bind a consent handler to an event. Handlers fire sequentially in
    /// bind order on every occurrence of the event.
    pub fn bind_callback(
        &self,
        event: PermissionEvent,
        handler: Arc<dyn PermissionHandler>,
    ) -> Result<CallbackHandle> {
        Ok(self.lock_callbacks()?.bind(event, handler))
    }

    /// Remove a binding. In-flight dispatch already past the handler is
    /// unaffected. Returns false if the handle is unknown.
    pub fn unbind_callback(&self, handle: CallbackHandle) -> Result<bool> {
        Ok(self.lock_callbacks()?.unbind(handle))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution Surface
    // ─────────────────────────────────────────────────────────────────────

    /// Grant an outstanding permission request.
    ///
    /// Unless ephemeral, the token is issued (or the previous token renewed)
    /// *before* waiters are released, so a granted caller always finds its
    /// token. All coalesced waiters observe the grant.
    pub async fn grant_permission(&self, id: RequestId, options: GrantOptions) -> Result<()> {
        let request = self.pending.request_for(id)?;

        if !options.ephemeral {
            let (expiry, amount) = match &request.access {
                AccessRequest::Spending { satoshis } => {
                    (NO_EXPIRY, Some(options.amount.unwrap_or(*satoshis)))
                }
                _ => (
                    options
                        .expiry
                        .unwrap_or_else(|| now_secs() + self.config.default_token_duration_secs),
                    None,
                ),
            };
            self.tokens.create_or_renew(&request, expiry, amount).await?;
        }

        self.pending.resolve(
            id,
            Decision::Granted {
                ephemeral: options.ephemeral,
            },
        )?;
        Ok(())
    }

    /// Deny an outstanding permission request. All coalesced waiters fail
    /// with `PermissionDenied`.
    pub async fn deny_permission(&self, id: RequestId) -> Result<()> {
        self.pending.resolve(id, Decision::Denied)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permission Evaluation
    // ─────────────────────────────────────────────────────────────────────

    /// Ensure the originator may use a protocol, seeking consent if needed.
    pub async fn ensure_protocol_permission(
        &self,
        originator: &OriginatorDomain,
        protocol_id: &ProtocolId,
        counterparty: &Counterparty,
        privileged: bool,
        usage: ProtocolUsage,
        reason: Option<&str>,
    ) -> Result<()> {
        if self.is_admin(originator) {
            return Ok(());
        }
        validation::validate_protocol_name(&protocol_id.name).map_err(PermissionError::Wallet)?;

        // Open-usage protocols and gated-off usages short-circuit before any
        // lookup or callback.
        if protocol_id.security_level == SecurityLevel::Open {
            return Ok(());
        }
        let seek = match usage {
            ProtocolUsage::Signing => self.config.seek_protocol_permissions_for_signing,
            ProtocolUsage::Encrypting => self.config.seek_protocol_permissions_for_encrypting,
            ProtocolUsage::Generic => true,
        };
        if !seek {
            return Ok(());
        }

        if protocol_id.name.starts_with(ADMIN_RESERVED_PREFIX) {
            return Err(PermissionError::AdminOnly(format!(
                "protocol \"{}\" is reserved for the admin originator",
                protocol_id.name
            )));
        }

        let request = PermissionRequest::new(
            originator.clone(),
            AccessRequest::Protocol {
                protocol_id: protocol_id.clone(),
                counterparty: counterparty.clone(),
            },
        )
        .with_privileged(self.effective_privileged(privileged));
        let request = match reason {
            Some(reason) => request.with_reason(reason),
            None => request,
        };

        self.evaluate_with_tokens(request).await
    }

    /// Ensure the originator may touch a basket, seeking consent if needed.
    pub async fn ensure_basket_access(
        &self,
        originator: &OriginatorDomain,
        basket: &BasketName,
        usage: BasketUsage,
        reason: Option<&str>,
    ) -> Result<()> {
        if self.is_admin(originator) {
            return Ok(());
        }
        validation::validate_basket_name(basket.as_str()).map_err(PermissionError::Wallet)?;

        if !self.config.seek_basket_insertion_permissions {
            return Ok(());
        }

        if basket.as_str() == DEFAULT_BASKET || basket.as_str().starts_with(ADMIN_RESERVED_PREFIX) {
            return Err(PermissionError::AdminOnly(format!(
                "basket \"{basket}\" is reserved for the admin originator"
            )));
        }

        let request = PermissionRequest::new(
            originator.clone(),
            AccessRequest::Basket {
                basket: basket.clone(),
            },
        );
        let request = match reason {
            Some(reason) => request.with_reason(reason),
            None => request.with_reason(format!("{} basket \"{basket}\"", usage.verb())),
        };

        self.evaluate_with_tokens(request).await
    }

    /// Ensure the originator may disclose certificate fields to a verifier,
    /// seeking consent if needed.
    pub async fn ensure_certificate_access(
        &self,
        originator: &OriginatorDomain,
        verifier: &IdentityKey,
        cert_type: &str,
        fields: &[String],
        privileged: bool,
        reason: Option<&str>,
    ) -> Result<()> {
        if self.is_admin(originator) {
            return Ok(());
        }
        validation::validate_certificate_type(cert_type).map_err(PermissionError::Wallet)?;

        if !self.config.seek_permissions_for_certificates {
            return Ok(());
        }

        let request = PermissionRequest::new(
            originator.clone(),
            AccessRequest::Certificate {
                verifier: verifier.clone(),
                cert_type: cert_type.to_string(),
                fields: fields.to_vec(),
            },
        )
        .with_privileged(self.effective_privileged(privileged));
        let request = match reason {
            Some(reason) => request.with_reason(reason),
            None => request,
        };

        self.evaluate_with_tokens(request).await
    }

    /// Ensure the originator may spend `satoshis`, seeking consent if needed.
    ///
    /// Spending authorization is a monthly ceiling: a token authorizes the
    /// originator's labeled net spend since the start of the current month.
    /// An exhausted (or absent) authorization turns into a renewal prompt.
    pub async fn ensure_spending_authorization(
        &self,
        originator: &OriginatorDomain,
        satoshis: u64,
        reason: Option<&str>,
    ) -> Result<()> {
        if self.is_admin(originator) {
            return Ok(());
        }
        if !self.config.seek_permissions_for_spending {
            return Ok(());
        }

        let request = PermissionRequest::new(
            originator.clone(),
            AccessRequest::Spending { satoshis },
        );
        let request = match reason {
            Some(reason) => request.with_reason(reason),
            None => request,
        };

        match self.tokens.find_token(&request).await? {
            None => self.seek_permission(request).await,
            Some(token) => {
                let authorized = token.authorized_amount().unwrap_or(0);
                let now = now_secs();
                let spent = self
                    .tokens
                    .query_spent_since(originator, month_start(now))
                    .await?;
                if spent.saturating_add(satoshis) <= authorized {
                    Ok(())
                } else {
                    self.seek_permission(request.into_renewal(token)).await
                }
            }
        }
    }

    /// Token lookup, renewal marking, and consent for the non-spending kinds.
    async fn evaluate_with_tokens(&self, request: PermissionRequest) -> Result<()> {
        match self.tokens.find_token(&request).await? {
            Some(token) if !token.is_expired(now_secs()) => Ok(()),
            Some(expired) => self.seek_permission(request.into_renewal(expired)).await,
            None => self.seek_permission(request).await,
        }
    }

    /// Suspend until the request's resource key is granted or denied.
    ///
    /// The first caller per key runs the callback round; coalesced callers
    /// only wait. Handler errors are logged and swallowed.
    async fn seek_permission(&self, request: PermissionRequest) -> Result<()> {
        let (rx, newly_created) = self.pending.register(&request)?;

        if let Some(request_id) = newly_created {
            let event = PermissionEvent::for_permission(request.permission_type());
            let handlers = self.lock_callbacks()?.handlers_for(event);
            tracing::debug!(
                %request_id,
                %event,
                key = %request.resource_key(),
                handlers = handlers.len(),
                "seeking permission"
            );
            let prompt = PermissionPrompt {
                request_id,
                request: request.clone(),
            };
            for (handle, handler) in handlers {
                if let Err(error) = handler.on_request(prompt.clone()).await {
                    tracing::warn!(%handle, %error, "permission callback failed");
                }
            }
        }

        match rx.await {
            Ok(Decision::Granted { .. }) => Ok(()),
            Ok(Decision::Denied) => Err(PermissionError::Denied(format!(
                "{} for {}",
                request.permission_type(),
                request.originator
            ))),
            Err(_) => Err(PermissionError::Internal(
                "consent channel closed before resolution".into(),
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Token Management Surface
    // ─────────────────────────────────────────────────────────────────────

    /// List protocol permission tokens, optionally for one originator.
    pub async fn list_protocol_permissions(
        &self,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Vec<PermissionToken>> {
        self.tokens
            .list_tokens_for(PermissionType::Protocol, originator)
            .await
    }

    /// List basket access tokens, optionally for one originator.
    pub async fn list_basket_access(
        &self,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Vec<PermissionToken>> {
        self.tokens
            .list_tokens_for(PermissionType::Basket, originator)
            .await
    }

    /// List certificate access tokens, optionally for one originator.
    pub async fn list_certificate_access(
        &self,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Vec<PermissionToken>> {
        self.tokens
            .list_tokens_for(PermissionType::Certificate, originator)
            .await
    }

    /// List spending authorization tokens, optionally for one originator.
    pub async fn list_spending_authorizations(
        &self,
        originator: Option<&OriginatorDomain>,
    ) -> Result<Vec<PermissionToken>> {
        self.tokens
            .list_tokens_for(PermissionType::Spending, originator)
            .await
    }

    /// Revoke a permission token. The token disappears from future lookups;
    /// the next matching ask prompts afresh.
    pub async fn revoke_permission(&self, token: &PermissionToken) -> Result<Txid> {
        self.tokens.revoke(token).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn is_admin(&self, originator: &OriginatorDomain) -> bool {
        *originator == self.admin_originator
    }

    /// Clear the privileged flag when privileged differentiation is off.
    fn effective_privileged(&self, privileged: bool) -> bool {
        privileged && self.config.differentiate_privileged_operations
    }

    fn lock_callbacks(&self) -> Result<std::sync::MutexGuard<'_, CallbackRegistry>> {
        self.callbacks
            .lock()
            .map_err(|e| PermissionError::Internal(format!("callback registry poisoned: {e}")))
    }

    /// Gate a protocol-scoped key operation for an originator call.
    async fn check_key_operation(
        &self,
        scope: &KeyScope,
        originator: Option<&OriginatorDomain>,
        usage: ProtocolUsage,
    ) -> walletgate_core::Result<()> {
        let Some(originator) = originator else {
            return Ok(());
        };
        self.ensure_protocol_permission(
            originator,
            &scope.protocol_id,
            &scope.counterparty,
            scope.privileged,
            usage,
            None,
        )
        .await
        .map_err(WalletError::from)
    }

    /// Gate basket access for an originator call.
    async fn check_basket(
        &self,
        basket: &BasketName,
        originator: Option<&OriginatorDomain>,
        usage: BasketUsage,
    ) -> walletgate_core::Result<()> {
        let Some(originator) = originator else {
            return Ok(());
        };
        self.ensure_basket_access(originator, basket, usage, None)
            .await
            .map_err(WalletError::from)
    }

    /// Gate certificate access for an originator call.
    async fn check_certificate(
        &self,
        verifier: &IdentityKey,
        cert_type: &str,
        fields: &[String],
        privileged: bool,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<()> {
        let Some(originator) = originator else {
            return Ok(());
        };
        self.ensure_certificate_access(originator, verifier, cert_type, fields, privileged, None)
            .await
            .map_err(WalletError::from)
    }

    /// The wallet's own identity key, used as the verifier identity when an
    /// originator inspects certificates without naming an external verifier.
    async fn self_verifier(&self) -> walletgate_core::Result<IdentityKey> {
        let result = self
            .underlying
            .get_public_key(
                GetPublicKeyArgs {
                    scope: KeyScope::self_scope(
                        ProtocolId::new_unchecked(SecurityLevel::Open, "identity"),
                        "1",
                    ),
                    identity_key: true,
                    for_self: true,
                },
                None,
            )
            .await?;
        Ok(result.public_key)
    }
}

#[async_trait::async_trait]
impl WalletInterface for WalletPermissionsManager {
    async fn get_public_key(
        &self,
        args: GetPublicKeyArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<GetPublicKeyResult> {
        // The root identity key is public; only privileged retrieval of it
        // is permission-gated.
        if !args.identity_key || args.scope.privileged {
            self.check_key_operation(&args.scope, originator, ProtocolUsage::Encrypting)
                .await?;
        }
        self.underlying.get_public_key(args, originator).await
    }

    async fn encrypt(
        &self,
        args: EncryptArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<EncryptResult> {
        self.check_key_operation(&args.scope, originator, ProtocolUsage::Encrypting)
            .await?;
        self.underlying.encrypt(args, originator).await
    }

    async fn decrypt(
        &self,
        args: DecryptArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<DecryptResult> {
        self.check_key_operation(&args.scope, originator, ProtocolUsage::Encrypting)
            .await?;
        self.underlying.decrypt(args, originator).await
    }

    async fn create_hmac(
        &self,
        args: CreateHmacArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<CreateHmacResult> {
        self.check_key_operation(&args.scope, originator, ProtocolUsage::Signing)
            .await?;
        self.underlying.create_hmac(args, originator).await
    }

    async fn verify_hmac(
        &self,
        args: VerifyHmacArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<VerifyHmacResult> {
        self.check_key_operation(&args.scope, originator, ProtocolUsage::Signing)
            .await?;
        self.underlying.verify_hmac(args, originator).await
    }

    async fn create_signature(
        &self,
        args: CreateSignatureArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<CreateSignatureResult> {
        self.check_key_operation(&args.scope, originator, ProtocolUsage::Signing)
            .await?;
        self.underlying.create_signature(args, originator).await
    }

    async fn verify_signature(
        &self,
        args: VerifySignatureArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<VerifySignatureResult> {
        self.check_key_operation(&args.scope, originator, ProtocolUsage::Signing)
            .await?;
        self.underlying.verify_signature(args, originator).await
    }

    async fn create_action(
        &self,
        mut args: CreateActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<CreateActionResult> {
        if let Some(origin) = originator {
            if !self.is_admin(origin) {
                for output in &args.outputs {
                    if let Some(basket) = &output.basket {
                        self.check_basket(basket, originator, BasketUsage::Insertion)
                            .await?;
                    }
                }

                let total = args.total_output_satoshis();
                if total > 0 {
                    self.ensure_spending_authorization(origin, total, Some(&args.description))
                        .await
                        .map_err(WalletError::from)?;
                }

                // Label the action so spending tallies can find it later.
                let label = originator_label(origin);
                if !args.labels.contains(&label) {
                    args.labels.push(label);
                }
            }
        }
        self.underlying.create_action(args, originator).await
    }

    async fn abort_action(
        &self,
        args: AbortActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<AbortActionResult> {
        self.underlying.abort_action(args, originator).await
    }

    async fn list_actions(
        &self,
        args: ListActionsArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<ListActionsResult> {
        self.underlying.list_actions(args, originator).await
    }

    async fn internalize_action(
        &self,
        args: InternalizeActionArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<InternalizeActionResult> {
        for output in &args.outputs {
            if output.protocol == InternalizeProtocol::BasketInsertion {
                if let Some(basket) = &output.basket {
                    self.check_basket(basket, originator, BasketUsage::Insertion)
                        .await?;
                }
            }
        }
        self.underlying.internalize_action(args, originator).await
    }

    async fn list_outputs(
        &self,
        args: ListOutputsArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<ListOutputsResult> {
        self.check_basket(&args.basket, originator, BasketUsage::Listing)
            .await?;
        self.underlying.list_outputs(args, originator).await
    }

    async fn relinquish_output(
        &self,
        args: RelinquishOutputArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<RelinquishOutputResult> {
        self.check_basket(&args.basket, originator, BasketUsage::Removal)
            .await?;
        self.underlying.relinquish_output(args, originator).await
    }

    async fn acquire_certificate(
        &self,
        args: AcquireCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<Certificate> {
        let fields: Vec<String> = args.fields.keys().cloned().collect();
        self.check_certificate(
            &args.certifier,
            &args.cert_type,
            &fields,
            args.privileged,
            originator,
        )
        .await?;
        self.underlying.acquire_certificate(args, originator).await
    }

    async fn list_certificates(
        &self,
        args: ListCertificatesArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<ListCertificatesResult> {
        if let Some(origin) = originator {
            if !self.is_admin(origin) && self.config.seek_permissions_for_certificates {
                if args.types.is_empty() {
                    return Err(WalletError::InvalidRequest(
                        "certificate types must be named when listing".into(),
                    ));
                }
                let verifier = self.self_verifier().await?;
                for cert_type in &args.types {
                    self.check_certificate(&verifier, cert_type, &[], args.privileged, originator)
                        .await?;
                }
            }
        }
        self.underlying.list_certificates(args, originator).await
    }

    async fn prove_certificate(
        &self,
        args: ProveCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<ProveCertificateResult> {
        self.check_certificate(
            &args.verifier,
            &args.certificate.cert_type,
            &args.fields_to_reveal,
            args.privileged,
            originator,
        )
        .await?;
        self.underlying.prove_certificate(args, originator).await
    }

    async fn relinquish_certificate(
        &self,
        args: RelinquishCertificateArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<RelinquishCertificateResult> {
        if let Some(origin) = originator {
            if !self.is_admin(origin) && self.config.seek_permissions_for_certificates {
                let verifier = self.self_verifier().await?;
                self.check_certificate(&verifier, &args.cert_type, &[], false, originator)
                    .await?;
            }
        }
        self.underlying
            .relinquish_certificate(args, originator)
            .await
    }

    async fn discover_by_identity_key(
        &self,
        args: DiscoverByIdentityKeyArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<DiscoverCertificatesResult> {
        // Discovery reads public data; never permission-gated.
        self.underlying
            .discover_by_identity_key(args, originator)
            .await
    }

    async fn discover_by_attributes(
        &self,
        args: DiscoverByAttributesArgs,
        originator: Option<&OriginatorDomain>,
    ) -> walletgate_core::Result<DiscoverCertificatesResult> {
        self.underlying
            .discover_by_attributes(args, originator)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_options_ephemeral() {
        let options = GrantOptions::ephemeral();
        assert!(options.ephemeral);
        assert!(options.expiry.is_none());
        assert!(options.amount.is_none());
    }

    #[test]
    fn test_basket_usage_verbs() {
        assert_eq!(BasketUsage::Insertion.verb(), "insert into");
        assert_eq!(BasketUsage::Removal.verb(), "remove from");
        assert_eq!(BasketUsage::Listing.verb(), "list");
    }
}
