//! Test fixtures and handler helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use walletgate::{
    GrantOptions, PermissionHandler, PermissionPrompt, PermissionsConfig,
    WalletPermissionsManager,
};
use walletgate_core::OriginatorDomain;

use crate::mock::MockWallet;

/// The admin originator used by fixtures.
pub const ADMIN_DOMAIN: &str = "admin.walletvendor.test";

/// A test fixture with a mock wallet and a manager wrapping it.
pub struct TestFixture {
    pub wallet: Arc<MockWallet>,
    pub manager: Arc<WalletPermissionsManager>,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PermissionsConfig::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: PermissionsConfig) -> Self {
        let wallet = Arc::new(MockWallet::from_seed([0x42; 32]));
        let manager = Arc::new(WalletPermissionsManager::new(
            wallet.clone(),
            OriginatorDomain::new(ADMIN_DOMAIN).expect("admin domain is well-formed"),
            config,
        ));
        Self { wallet, manager }
    }

    /// The admin originator.
    pub fn admin(&self) -> OriginatorDomain {
        OriginatorDomain::new(ADMIN_DOMAIN).expect("admin domain is well-formed")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an originator domain, panicking on malformed input.
pub fn originator(domain: &str) -> OriginatorDomain {
    OriginatorDomain::new(domain).expect("test domain is well-formed")
}

/// Forwards every prompt into an unbounded channel for the test to resolve.
pub struct ChannelHandler(pub mpsc::UnboundedSender<PermissionPrompt>);

impl ChannelHandler {
    /// Create a handler and the receiving end of its channel.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PermissionPrompt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self(tx)), rx)
    }
}

#[async_trait]
impl PermissionHandler for ChannelHandler {
    async fn on_request(&self, prompt: PermissionPrompt) -> anyhow::Result<()> {
        self.0.send(prompt)?;
        Ok(())
    }
}

/// Counts invocations without resolving anything.
#[derive(Default)]
pub struct CountingHandler {
    count: AtomicUsize,
}

impl CountingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of prompts received so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionHandler for CountingHandler {
    async fn on_request(&self, _prompt: PermissionPrompt) -> anyhow::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always errors; for exercising handler failure isolation.
pub struct FailingHandler;

#[async_trait]
impl PermissionHandler for FailingHandler {
    async fn on_request(&self, _prompt: PermissionPrompt) -> anyhow::Result<()> {
        anyhow::bail!("handler exploded")
    }
}

/// Grants every prompt immediately with fixed options.
pub struct AutoGrantHandler {
    manager: Arc<WalletPermissionsManager>,
    options: GrantOptions,
}

impl AutoGrantHandler {
    pub fn new(manager: Arc<WalletPermissionsManager>, options: GrantOptions) -> Arc<Self> {
        Arc::new(Self { manager, options })
    }
}

#[async_trait]
impl PermissionHandler for AutoGrantHandler {
    async fn on_request(&self, prompt: PermissionPrompt) -> anyhow::Result<()> {
        self.manager
            .grant_permission(prompt.request_id, self.options.clone())
            .await?;
        Ok(())
    }
}

/// Denies every prompt immediately.
pub struct AutoDenyHandler {
    manager: Arc<WalletPermissionsManager>,
}

impl AutoDenyHandler {
    pub fn new(manager: Arc<WalletPermissionsManager>) -> Arc<Self> {
        Arc::new(Self { manager })
    }
}

#[async_trait]
impl PermissionHandler for AutoDenyHandler {
    async fn on_request(&self, prompt: PermissionPrompt) -> anyhow::Result<()> {
        self.manager.deny_permission(prompt.request_id).await?;
        Ok(())
    }
}
