//! Consent-flow behavior of the permissions manager: short-circuits,
//! coalescing, denial, failure isolation, and reserved names.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use walletgate::{
    GrantOptions, PermissionEvent, PermissionsConfig, RequestId, WalletPermissionsManager,
};
use walletgate_core::{
    Counterparty, EncryptArgs, KeyScope, ListOutputsArgs, ProtocolId, QueryMode, SecurityLevel,
    WalletError,
};
use walletgate_testkit::{
    originator, AutoDenyHandler, AutoGrantHandler, ChannelHandler, CountingHandler,
    FailingHandler, TestFixture,
};

fn scope(level: SecurityLevel, name: &str) -> KeyScope {
    KeyScope {
        protocol_id: ProtocolId::new_unchecked(level, name),
        key_id: "1".into(),
        counterparty: Counterparty::SelfKey,
        privileged: false,
    }
}

fn encrypt_args(level: SecurityLevel, name: &str) -> EncryptArgs {
    EncryptArgs {
        scope: scope(level, name),
        plaintext: Bytes::from_static(b"payload"),
    }
}

fn list_outputs_args(basket: &str) -> ListOutputsArgs {
    ListOutputsArgs {
        basket: walletgate_core::BasketName::new(basket).unwrap(),
        tags: vec![],
        tag_query_mode: QueryMode::Any,
        include_locking_scripts: false,
        limit: 100,
    }
}

async fn encrypt_as(
    manager: &WalletPermissionsManager,
    origin: &str,
    level: SecurityLevel,
    name: &str,
) -> walletgate_core::Result<()> {
    use walletgate_core::WalletInterface;
    let origin = originator(origin);
    manager
        .encrypt(encrypt_args(level, name), Some(&origin))
        .await
        .map(|_| ())
}

#[tokio::test]
async fn open_protocols_skip_permissions_entirely() {
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, counting.clone())
        .unwrap();

    encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::Open,
        "public notes",
    )
    .await
    .unwrap();

    assert_eq!(counting.count(), 0);
    assert_eq!(fixture.wallet.call_count("encrypt"), 1);
    assert_eq!(fixture.wallet.call_count("create_action"), 0);
}

#[tokio::test]
async fn gated_off_usage_skips_permissions() {
    let config = PermissionsConfig {
        seek_protocol_permissions_for_encrypting: false,
        ..PermissionsConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let counting = CountingHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, counting.clone())
        .unwrap();

    encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::Counterparty,
        "private notes",
    )
    .await
    .unwrap();

    assert_eq!(counting.count(), 0);
    assert_eq!(fixture.wallet.call_count("encrypt"), 1);
}

#[tokio::test]
async fn admin_originator_bypasses_all_checks() {
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, counting.clone())
        .unwrap();

    // Even a reserved protocol name is fine for the admin.
    use walletgate_core::WalletInterface;
    let admin = fixture.admin();
    fixture
        .manager
        .encrypt(
            encrypt_args(SecurityLevel::Counterparty, "admin bookkeeping"),
            Some(&admin),
        )
        .await
        .unwrap();

    assert_eq!(counting.count(), 0);
    assert_eq!(fixture.wallet.call_count("encrypt"), 1);
}

#[tokio::test]
async fn reserved_protocol_fails_fast_for_non_admin() {
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, counting.clone())
        .unwrap();

    let result = encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::App,
        "admin bookkeeping",
    )
    .await;

    assert!(matches!(result, Err(WalletError::AdminOnlyViolation(_))));
    assert_eq!(counting.count(), 0);
    assert_eq!(fixture.wallet.call_count("encrypt"), 0);
    assert_eq!(fixture.wallet.call_count("create_action"), 0);
}

#[tokio::test]
async fn reserved_baskets_fail_fast_for_non_admin() {
    use walletgate_core::WalletInterface;
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::BasketAccessRequested, counting.clone())
        .unwrap();
    let origin = originator("app.example.test");

    for basket in ["admin secret-basket", "default"] {
        let result = fixture
            .manager
            .list_outputs(list_outputs_args(basket), Some(&origin))
            .await;
        assert!(
            matches!(result, Err(WalletError::AdminOnlyViolation(_))),
            "basket {basket:?} must be reserved"
        );
    }

    assert_eq!(counting.count(), 0);
    assert_eq!(fixture.wallet.call_count("list_outputs"), 0);
    assert_eq!(fixture.wallet.call_count("create_action"), 0);
}

#[tokio::test]
async fn malformed_protocol_name_is_invalid_request() {
    let fixture = TestFixture::new();
    let result = encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::App,
        "ab", // too short
    )
    .await;

    assert!(matches!(result, Err(WalletError::InvalidRequest(_))));
    assert_eq!(fixture.wallet.call_count("encrypt"), 0);
}

#[tokio::test]
async fn denied_request_never_reaches_the_wallet() {
    let fixture = TestFixture::new();
    fixture
        .manager
        .bind_callback(
            PermissionEvent::ProtocolPermissionRequested,
            AutoDenyHandler::new(fixture.manager.clone()),
        )
        .unwrap();

    let result = encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::App,
        "todo list",
    )
    .await;

    assert!(matches!(result, Err(WalletError::PermissionDenied(_))));
    assert_eq!(fixture.wallet.call_count("encrypt"), 0);
    assert_eq!(fixture.wallet.call_count("create_action"), 0);
}

#[tokio::test]
async fn ephemeral_grant_persists_no_token() {
    let fixture = TestFixture::new();
    fixture
        .manager
        .bind_callback(
            PermissionEvent::ProtocolPermissionRequested,
            AutoGrantHandler::new(fixture.manager.clone(), GrantOptions::ephemeral()),
        )
        .unwrap();

    encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::App,
        "todo list",
    )
    .await
    .unwrap();

    assert_eq!(fixture.wallet.call_count("create_action"), 0);
    assert_eq!(fixture.wallet.call_count("encrypt"), 1);
}

#[tokio::test]
async fn concurrent_identical_requests_share_one_prompt() {
    let fixture = TestFixture::new();
    let (handler, mut prompts) = ChannelHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, handler)
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let manager = fixture.manager.clone();
        tasks.push(tokio::spawn(async move {
            encrypt_as(&manager, "app.example.test", SecurityLevel::App, "todo list").await
        }));
    }

    let prompt = prompts.recv().await.expect("one prompt fires");
    // Give the remaining callers time to coalesce onto the pending entry.
    tokio::time::sleep(Duration::from_millis(100)).await;

    fixture
        .manager
        .grant_permission(prompt.request_id, GrantOptions::ephemeral())
        .await
        .unwrap();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(prompts.try_recv().is_err(), "no second prompt for the same key");
    assert_eq!(fixture.wallet.call_count("encrypt"), 3);
}

#[tokio::test]
async fn distinct_resources_prompt_independently() {
    let fixture = TestFixture::new();
    let (handler, mut prompts) = ChannelHandler::new();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, handler)
        .unwrap();

    let mut tasks = Vec::new();
    for name in ["todo list", "photo album"] {
        let manager = fixture.manager.clone();
        tasks.push(tokio::spawn(async move {
            encrypt_as(&manager, "app.example.test", SecurityLevel::App, name).await
        }));
    }

    let first = prompts.recv().await.expect("first prompt");
    let second = prompts.recv().await.expect("second prompt");
    assert_ne!(first.request_id, second.request_id);

    for prompt in [first, second] {
        fixture
            .manager
            .grant_permission(prompt.request_id, GrantOptions::ephemeral())
            .await
            .unwrap();
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn failing_handler_does_not_stop_later_handlers() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    fixture
        .manager
        .bind_callback(
            PermissionEvent::ProtocolPermissionRequested,
            Arc::new(FailingHandler),
        )
        .unwrap();
    fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, counting.clone())
        .unwrap();
    fixture
        .manager
        .bind_callback(
            PermissionEvent::ProtocolPermissionRequested,
            AutoGrantHandler::new(fixture.manager.clone(), GrantOptions::ephemeral()),
        )
        .unwrap();

    encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::App,
        "todo list",
    )
    .await
    .unwrap();

    // The failing handler neither blocked the counting handler nor the
    // granting one, and did not itself resolve the request.
    assert_eq!(counting.count(), 1);
    assert_eq!(fixture.wallet.call_count("encrypt"), 1);
}

#[tokio::test]
async fn unbound_handler_stops_receiving_prompts() {
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    let handle = fixture
        .manager
        .bind_callback(PermissionEvent::ProtocolPermissionRequested, counting.clone())
        .unwrap();
    fixture
        .manager
        .bind_callback(
            PermissionEvent::ProtocolPermissionRequested,
            AutoGrantHandler::new(fixture.manager.clone(), GrantOptions::ephemeral()),
        )
        .unwrap();

    assert!(fixture.manager.unbind_callback(handle).unwrap());

    encrypt_as(
        &fixture.manager,
        "app.example.test",
        SecurityLevel::App,
        "todo list",
    )
    .await
    .unwrap();

    assert_eq!(counting.count(), 0);
}

#[tokio::test]
async fn resolving_unknown_requests_is_an_error_not_a_crash() {
    let fixture = TestFixture::new();
    let result = fixture
        .manager
        .grant_permission(RequestId(999), GrantOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(walletgate::PermissionError::UnknownRequest(_))
    ));

    let result = fixture.manager.deny_permission(RequestId(999)).await;
    assert!(matches!(
        result,
        Err(walletgate::PermissionError::UnknownRequest(_))
    ));
}

#[tokio::test]
async fn discovery_is_never_gated() {
    use walletgate_core::{DiscoverByIdentityKeyArgs, IdentityKey, WalletInterface};
    let fixture = TestFixture::new();
    let counting = CountingHandler::new();
    for event in [
        PermissionEvent::ProtocolPermissionRequested,
        PermissionEvent::CertificateAccessRequested,
    ] {
        fixture.manager.bind_callback(event, counting.clone()).unwrap();
    }

    let origin = originator("app.example.test");
    fixture
        .manager
        .discover_by_identity_key(
            DiscoverByIdentityKeyArgs {
                identity_key: IdentityKey::new(format!("02{}", "ab".repeat(32))).unwrap(),
                limit: 10,
            },
            Some(&origin),
        )
        .await
        .unwrap();

    assert_eq!(counting.count(), 0);
    assert_eq!(fixture.wallet.call_count("discover_by_identity_key"), 1);
}
