// ABOUTME: Shared test helpers: manual clock, scripted provider double, seeding
// ABOUTME: Lets lifecycle tests control time and every provider response
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

#![allow(dead_code)] // each integration-test crate uses a subset of these helpers

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use fitlink::clock::Clock;
use fitlink::models::{LinkedAccount, ProviderProfile, TokenExchange, TokenTuple};
use fitlink::oauth::PkceParams;
use fitlink::providers::{DailyMetric, FitnessProvider, ProviderError, TokenTypeHint};
use fitlink::store::CredentialStore;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Fixed test epoch: 2025-06-01 12:00:00 UTC
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap()
}

/// Manually advanced clock so tests control expiry math
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Scripted provider double.
///
/// Code exchanges return a fixed response; refreshes rotate token pairs
/// (`AT2`/`RT2`, `AT3`/`RT3`, ...) while tracking which refresh token is
/// currently valid, so reusing a rotated-out token is rejected the way the
/// real provider rejects it. Metric calls pop scripted results.
pub struct FakeProvider {
    valid_refresh_token: Mutex<String>,
    refresh_serial: AtomicUsize,
    refresh_calls: AtomicUsize,
    refresh_delay: Mutex<Option<Duration>>,
    fail_refresh_with: Mutex<Option<ProviderError>>,
    revoke_calls: AtomicUsize,
    fail_revoke: AtomicBool,
    metric_script: Mutex<VecDeque<Result<f64, ProviderError>>>,
    metric_dates: Mutex<Vec<NaiveDate>>,
    provider_account_id: String,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            valid_refresh_token: Mutex::new("RT1".into()),
            refresh_serial: AtomicUsize::new(2),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay: Mutex::new(None),
            fail_refresh_with: Mutex::new(None),
            revoke_calls: AtomicUsize::new(0),
            fail_revoke: AtomicBool::new(false),
            metric_script: Mutex::new(VecDeque::new()),
            metric_dates: Mutex::new(Vec::new()),
            provider_account_id: "FBX1".into(),
        }
    }

    /// Number of refresh calls that reached the provider
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    /// Make every revocation call fail as unreachable
    pub fn fail_revocations(&self) {
        self.fail_revoke.store(true, Ordering::SeqCst);
    }

    /// Slow refreshes down so concurrent callers actually overlap
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = Some(delay);
    }

    /// Make the next refreshes fail with the given error
    pub fn fail_refresh_with(&self, err: ProviderError) {
        *self.fail_refresh_with.lock().unwrap() = Some(err);
    }

    /// Queue the result of the next daily-metric call
    pub fn push_metric_result(&self, result: Result<f64, ProviderError>) {
        self.metric_script.lock().unwrap().push_back(result);
    }

    /// Dates the daily-metric endpoint was asked for, in call order
    pub fn metric_dates(&self) -> Vec<NaiveDate> {
        self.metric_dates.lock().unwrap().clone()
    }
}

#[async_trait]
impl FitnessProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn authorization_url(&self, state: &str, pkce: &PkceParams) -> Result<String, ProviderError> {
        let mut url = Url::parse("https://provider.test/oauth2/authorize").unwrap();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", "test-client")
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method);
        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: &str,
    ) -> Result<TokenExchange, ProviderError> {
        *self.valid_refresh_token.lock().unwrap() = "RT1".into();
        Ok(TokenExchange {
            access_token: "AT1".into(),
            refresh_token: "RT1".into(),
            expires_in: 28_800,
            scope: "activity profile".into(),
            provider_account_id: Some(self.provider_account_id.clone()),
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenExchange, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.refresh_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.fail_refresh_with.lock().unwrap().clone() {
            return Err(err);
        }

        let mut valid = self.valid_refresh_token.lock().unwrap();
        if *valid != refresh_token {
            return Err(ProviderError::BadRequest {
                detail: "invalid_grant: refresh token invalid".into(),
            });
        }

        let serial = self.refresh_serial.fetch_add(1, Ordering::SeqCst);
        *valid = format!("RT{serial}");

        Ok(TokenExchange {
            access_token: format!("AT{serial}"),
            refresh_token: format!("RT{serial}"),
            expires_in: 28_800,
            scope: "activity profile".into(),
            provider_account_id: Some(self.provider_account_id.clone()),
        })
    }

    async fn revoke_token(&self, _token: &str, _hint: TokenTypeHint) -> Result<(), ProviderError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable {
                detail: "connection refused".into(),
            });
        }
        Ok(())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<ProviderProfile, ProviderError> {
        Ok(ProviderProfile {
            display_name: "Test Athlete".into(),
            full_name: Some("Test Athlete Jr.".into()),
            avatar: None,
        })
    }

    async fn daily_metric(
        &self,
        _access_token: &str,
        _metric: DailyMetric,
        date: NaiveDate,
    ) -> Result<f64, ProviderError> {
        self.metric_dates.lock().unwrap().push(date);
        self.metric_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(7777.0))
    }
}

/// Seed a linked account with explicit credentials, bypassing the flow
pub async fn seed_account(
    store: &dyn CredentialStore,
    user_id: Uuid,
    access_token: &str,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> LinkedAccount {
    store
        .upsert_link(
            user_id,
            "FBX1",
            TokenTuple {
                access_token: access_token.into(),
                refresh_token: refresh_token.into(),
                expires_at,
            },
            ProviderProfile {
                display_name: "Test Athlete".into(),
                full_name: None,
                avatar: None,
            },
        )
        .await
        .expect("seeding linked account should succeed")
}
