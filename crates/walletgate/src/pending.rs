//! Pending consent requests.
//!
//! One entry exists per [`ResourceKey`] at any time. The first caller for a
//! key creates the entry and owns the callback round; later callers for the
//! same key register as additional waiters and share the eventual decision.
//! Check-and-register happens under one lock acquisition, so two concurrent
//! callers cannot both create an entry for one key.
//!
//! Waiters hold `oneshot` receivers; resolution removes the entry and fans
//! the decision out to every sender, so all callers observe the identical
//! outcome.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::oneshot;

use walletgate_tokens::{PermissionRequest, ResourceKey};

use crate::error::{PermissionError, Result};

/// Handle for one outstanding consent decision.
///
/// Stable for the lifetime of the decision; the only handle
/// `grant_permission` / `deny_permission` accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

/// The outcome of a consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Consent granted. Ephemeral grants persist no token.
    Granted {
        /// True when the grant applies to this ask only.
        ephemeral: bool,
    },
    /// Consent refused.
    Denied,
}

struct PendingEntry {
    /// The representative request (the first caller's) shown to handlers.
    request: PermissionRequest,
    waiters: Vec<oneshot::Sender<Decision>>,
}

#[derive(Default)]
struct PendingState {
    by_key: HashMap<ResourceKey, PendingEntry>,
    by_id: HashMap<RequestId, ResourceKey>,
    next_id: u64,
}

/// The pending-request map, owned by one manager instance.
#[derive(Default)]
pub(crate) struct PendingRequests {
    inner: Mutex<PendingState>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a decision for the request's resource key.
    ///
    /// Returns the receiver for the decision and, when this call created the
    /// entry, the new [`RequestId`] — the caller then owns the callback
    /// round. A coalesced caller gets `None` and triggers no callbacks.
    pub fn register(
        &self,
        request: &PermissionRequest,
    ) -> Result<(oneshot::Receiver<Decision>, Option<RequestId>)> {
        let key = request.resource_key();
        let (tx, rx) = oneshot::channel();

        let mut state = self.lock()?;
        if let Some(entry) = state.by_key.get_mut(&key) {
            entry.waiters.push(tx);
            return Ok((rx, None));
        }

        let request_id = RequestId(state.next_id);
        state.next_id += 1;
        state.by_key.insert(
            key.clone(),
            PendingEntry {
                request: request.clone(),
                waiters: vec![tx],
            },
        );
        state.by_id.insert(request_id, key);
        Ok((rx, Some(request_id)))
    }

    /// The representative request for an outstanding decision.
    pub fn request_for(&self, id: RequestId) -> Result<PermissionRequest> {
        let state = self.lock()?;
        let key = state
            .by_id
            .get(&id)
            .ok_or(PermissionError::UnknownRequest(id))?;
        let entry = state
            .by_key
            .get(key)
            .ok_or(PermissionError::UnknownRequest(id))?;
        Ok(entry.request.clone())
    }

    /// Resolve an outstanding decision, releasing every waiter with the
    /// identical outcome. Returns the number of waiters released.
    ///
    /// Resolving an unknown or already-resolved id is an error, not a crash.
    pub fn resolve(&self, id: RequestId, decision: Decision) -> Result<usize> {
        let entry = {
            let mut state = self.lock()?;
            let key = state
                .by_id
                .remove(&id)
                .ok_or(PermissionError::UnknownRequest(id))?;
            state
                .by_key
                .remove(&key)
                .ok_or(PermissionError::UnknownRequest(id))?
        };

        let released = entry.waiters.len();
        for waiter in entry.waiters {
            // A waiter that gave up (dropped receiver) is fine to skip.
            let _ = waiter.send(decision);
        }
        Ok(released)
    }

    /// Number of outstanding decisions.
    pub fn outstanding(&self) -> usize {
        self.lock().map(|state| state.by_key.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PendingState>> {
        self.inner
            .lock()
            .map_err(|e| PermissionError::Internal(format!("pending map poisoned: {e}")))
    }
}
