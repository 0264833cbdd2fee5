//! Consent events and the callback registry.
//!
//! Applications embed the manager and bind handlers that surface consent
//! prompts to the user. Handlers for one event fire sequentially in bind
//! order; a handler error is logged and swallowed so one misbehaving UI
//! handler cannot starve the others or wedge the pending request.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use walletgate_tokens::{PermissionRequest, PermissionType};

use crate::pending::RequestId;

/// The four consent event kinds, one per permission token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionEvent {
    /// A protocol permission is being requested.
    ProtocolPermissionRequested,
    /// Basket access is being requested.
    BasketAccessRequested,
    /// Certificate access is being requested.
    CertificateAccessRequested,
    /// Spending authorization is being requested.
    SpendingAuthorizationRequested,
}

impl PermissionEvent {
    /// The event raised for requests of the given kind.
    pub fn for_permission(permission_type: PermissionType) -> Self {
        match permission_type {
            PermissionType::Protocol => Self::ProtocolPermissionRequested,
            PermissionType::Basket => Self::BasketAccessRequested,
            PermissionType::Certificate => Self::CertificateAccessRequested,
            PermissionType::Spending => Self::SpendingAuthorizationRequested,
        }
    }
}

impl fmt::Display for PermissionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolPermissionRequested => write!(f, "protocol_permission_requested"),
            Self::BasketAccessRequested => write!(f, "basket_access_requested"),
            Self::CertificateAccessRequested => write!(f, "certificate_access_requested"),
            Self::SpendingAuthorizationRequested => write!(f, "spending_authorization_requested"),
        }
    }
}

/// A consent prompt delivered to bound handlers.
///
/// `request_id` is the only handle `grant_permission` / `deny_permission`
/// accept; the full request (including `renewal` and `previous_token` where
/// applicable) rides along for display.
#[derive(Debug, Clone)]
pub struct PermissionPrompt {
    /// Handle for resolving this request.
    pub request_id: RequestId,
    /// The request awaiting consent.
    pub request: PermissionRequest,
}

/// A bound consent handler.
///
/// Errors are logged and swallowed: they neither stop later handlers nor
/// resolve the pending request.
#[async_trait]
pub trait PermissionHandler: Send + Sync {
    /// Called once per consent prompt for the bound event.
    async fn on_request(&self, prompt: PermissionPrompt) -> anyhow::Result<()>;
}

/// Adapter implementing [`PermissionHandler`] for an async closure.
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> PermissionHandler for FnHandler<F>
where
    F: Fn(PermissionPrompt) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn on_request(&self, prompt: PermissionPrompt) -> anyhow::Result<()> {
        (self.0)(prompt).await
    }
}

/// Wrap an async closure as a bindable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn PermissionHandler>
where
    F: Fn(PermissionPrompt) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// A stable handle identifying one callback binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(pub u64);

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback:{}", self.0)
    }
}

/// Per-event ordered handler table with a monotonically increasing handle
/// counter. Unbinding is by handle only; handler identity is never compared.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    bindings: HashMap<PermissionEvent, Vec<(CallbackHandle, Arc<dyn PermissionHandler>)>>,
    next_handle: u64,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to an event; returns its handle.
    pub fn bind(&mut self, event: PermissionEvent, handler: Arc<dyn PermissionHandler>) -> CallbackHandle {
        let handle = CallbackHandle(self.next_handle);
        self.next_handle += 1;
        self.bindings.entry(event).or_default().push((handle, handler));
        handle
    }

    /// Remove a binding by handle. Returns false if no such binding exists.
    pub fn unbind(&mut self, handle: CallbackHandle) -> bool {
        for handlers in self.bindings.values_mut() {
            if let Some(idx) = handlers.iter().position(|(h, _)| *h == handle) {
                handlers.remove(idx);
                return true;
            }
        }
        false
    }

    /// Snapshot the handlers bound to an event, in bind order.
    ///
    /// Dispatch iterates the snapshot, so unbinding mid-dispatch only
    /// affects future occurrences.
    pub fn handlers_for(
        &self,
        event: PermissionEvent,
    ) -> Vec<(CallbackHandle, Arc<dyn PermissionHandler>)> {
        self.bindings.get(&event).cloned().unwrap_or_default()
    }
}
