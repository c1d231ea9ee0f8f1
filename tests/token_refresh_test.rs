// ABOUTME: Test suite for refresh deduplication, rotation safety, and expiry windows
// ABOUTME: Covers single-flight refresh, rotated-token rejection, and transient failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

mod common;

use chrono::Duration;
use common::{seed_account, test_epoch, FakeProvider, ManualClock};
use fitlink::clock::Clock;
use fitlink::errors::LinkError;
use fitlink::manager::LinkManager;
use fitlink::providers::ProviderError;
use fitlink::store::{CredentialStore, MemoryCredentialStore};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

fn setup() -> (
    Arc<ManualClock>,
    Arc<FakeProvider>,
    Arc<MemoryCredentialStore>,
    Arc<LinkManager>,
) {
    let clock = Arc::new(ManualClock::new(test_epoch()));
    let provider = Arc::new(FakeProvider::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let manager = Arc::new(LinkManager::with_clock(
        store.clone(),
        provider.clone(),
        clock.clone(),
    ));
    (clock, provider, store, manager)
}

/// P1: N concurrent ensure_valid calls on a token inside the refresh window
/// make exactly one provider refresh call, and every caller sees its result
#[tokio::test]
async fn concurrent_refreshes_are_deduplicated() {
    let (clock, provider, store, manager) = setup();
    let user = Uuid::new_v4();

    seed_account(store.as_ref(), user, "AT1", "RT1", clock.now() + Duration::seconds(60)).await;
    provider.set_refresh_delay(StdDuration::from_millis(50));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move { manager.ensure_valid(user).await }));
    }

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.expect("task").expect("ensure_valid"));
    }

    assert_eq!(provider.refresh_calls(), 1);
    assert!(tokens.iter().all(|t| t == "AT2"), "tokens: {tokens:?}");
}

/// Scenario B: a token expiring in ~3.3 minutes is refreshed before use and
/// the new tuple is persisted
#[tokio::test]
async fn near_expiry_token_is_refreshed_and_persisted() {
    let (clock, provider, store, manager) = setup();
    let user = Uuid::new_v4();

    seed_account(
        store.as_ref(),
        user,
        "AT1",
        "RT1",
        clock.now() + Duration::milliseconds(200_000),
    )
    .await;

    let token = manager.ensure_valid(user).await.expect("ensure_valid");

    assert_ne!(token, "AT1");
    assert_eq!(token, "AT2");
    assert_eq!(provider.refresh_calls(), 1);

    let stored = store
        .get_account(user)
        .await
        .expect("store read")
        .expect("account exists");
    let credentials = stored.credentials.expect("credentials persisted");
    assert_eq!(credentials.access_token, "AT2");
    assert_eq!(credentials.refresh_token, "RT2");
}

/// A token with more than the safety window remaining is used as-is
#[tokio::test]
async fn fresh_token_is_not_refreshed() {
    let (clock, provider, store, manager) = setup();
    let user = Uuid::new_v4();

    seed_account(store.as_ref(), user, "AT1", "RT1", clock.now() + Duration::hours(8)).await;

    let token = manager.ensure_valid(user).await.expect("ensure_valid");

    assert_eq!(token, "AT1");
    assert_eq!(provider.refresh_calls(), 0);
}

/// P2: the provider rotates the refresh token on every refresh — the new
/// one keeps working, the rotated-out one is rejected and severs the link
#[tokio::test]
async fn rotated_refresh_token_must_be_used() {
    let (clock, provider, store, manager) = setup();
    let user = Uuid::new_v4();

    seed_account(store.as_ref(), user, "AT1", "RT1", clock.now() + Duration::seconds(60)).await;

    // First refresh rotates RT1 -> RT2
    let token = manager.ensure_valid(user).await.expect("first refresh");
    assert_eq!(token, "AT2");

    // The rotated-in RT2 refreshes fine when AT2 nears expiry
    clock.advance(Duration::hours(8) - Duration::minutes(2));
    let token = manager.ensure_valid(user).await.expect("second refresh");
    assert_eq!(token, "AT3");

    // Write back a tuple carrying the long-rotated-out RT1: the provider
    // rejects it and the link is severed
    let account = store
        .get_account(user)
        .await
        .expect("store read")
        .expect("account exists");
    store
        .swap_credentials(
            user,
            account.version,
            Some(fitlink::models::TokenTuple {
                access_token: "AT-old".into(),
                refresh_token: "RT1".into(),
                expires_at: clock.now() + Duration::seconds(60),
            }),
        )
        .await
        .expect("seed stale tuple");

    let err = manager
        .ensure_valid(user)
        .await
        .expect_err("stale refresh token");
    assert!(matches!(err, LinkError::ReconnectRequired));
    assert!(!manager.connection_status(user).await.expect("status"));
}

/// A transient provider outage during refresh surfaces as retryable and
/// leaves the stored tuple untouched
#[tokio::test]
async fn unavailable_provider_does_not_mutate_credentials() {
    let (clock, provider, store, manager) = setup();
    let user = Uuid::new_v4();

    seed_account(store.as_ref(), user, "AT1", "RT1", clock.now() + Duration::seconds(60)).await;
    provider.fail_refresh_with(ProviderError::Unavailable {
        detail: "gateway timeout".into(),
    });

    let err = manager.ensure_valid(user).await.expect_err("outage");
    assert!(matches!(err, LinkError::ProviderUnavailable { .. }));

    let stored = store
        .get_account(user)
        .await
        .expect("store read")
        .expect("account exists");
    let credentials = stored.credentials.expect("credentials retained");
    assert_eq!(credentials.access_token, "AT1");
    assert_eq!(credentials.refresh_token, "RT1");
}

/// ensure_valid with no linked account fails closed without any network call
#[tokio::test]
async fn missing_connection_fails_closed() {
    let (_clock, provider, _store, manager) = setup();

    let err = manager
        .ensure_valid(Uuid::new_v4())
        .await
        .expect_err("no link");
    assert!(matches!(err, LinkError::ConnectionRequired));
    assert_eq!(provider.refresh_calls(), 0);
}

/// A half-present tuple is corrupt state and reads as not connected
#[tokio::test]
async fn corrupt_tuple_reads_as_not_connected() {
    let (clock, provider, store, manager) = setup();
    let user = Uuid::new_v4();

    seed_account(store.as_ref(), user, "AT1", "", clock.now() + Duration::hours(8)).await;

    let err = manager.ensure_valid(user).await.expect_err("corrupt tuple");
    assert!(matches!(err, LinkError::ConnectionRequired));
    assert_eq!(provider.refresh_calls(), 0);
    assert!(!manager.connection_status(user).await.expect("status"));
}
