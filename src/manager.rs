// ABOUTME: Facade composing the flow, refresher, revoker, and guard
// ABOUTME: The single entry point hosting applications embed
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! # Link Manager
//!
//! [`LinkManager`] exposes the operations the hosting application calls:
//! `begin_link`, `complete_link`, `ensure_valid`, `disconnect`, and
//! `fetch_today_metric`. It owns the linking invariant (one provider account
//! maps to one user) and the refresh-and-retry-once behavior around data
//! calls.

use crate::clock::{Clock, SystemClock};
use crate::errors::LinkError;
use crate::guard::ConnectionGuard;
use crate::models::{AuthorizationRequest, LinkedAccount};
use crate::oauth::{AuthorizationFlow, TokenRefresher, TokenRevoker};
use crate::providers::{DailyMetric, FitnessProvider, ProviderError};
use crate::store::{CredentialStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Facade over the token lifecycle for one provider
pub struct LinkManager {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn FitnessProvider>,
    clock: Arc<dyn Clock>,
    flow: AuthorizationFlow,
    guard: ConnectionGuard,
    revoker: TokenRevoker,
}

impl LinkManager {
    /// Create a manager with the wall clock
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn FitnessProvider>) -> Self {
        Self::with_clock(store, provider, Arc::new(SystemClock))
    }

    /// Create a manager with an injected clock (tests, simulations)
    #[must_use]
    pub fn with_clock(
        store: Arc<dyn CredentialStore>,
        provider: Arc<dyn FitnessProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let flow = AuthorizationFlow::new(provider.clone(), clock.clone());
        let refresher = Arc::new(TokenRefresher::new(
            store.clone(),
            provider.clone(),
            clock.clone(),
        ));
        let guard = ConnectionGuard::new(store.clone(), refresher, clock.clone());
        let revoker = TokenRevoker::new(store.clone(), provider.clone());

        Self {
            store,
            provider,
            clock,
            flow,
            guard,
            revoker,
        }
    }

    /// Start linking a provider account: returns the authorization URL the
    /// user must visit.
    ///
    /// # Errors
    /// Returns [`LinkError::BadRequest`] if the authorization URL cannot be
    /// built
    pub async fn begin_link(&self, user_id: Uuid) -> Result<AuthorizationRequest, LinkError> {
        debug!(%user_id, provider = self.provider.name(), "link requested");
        self.flow.begin().await
    }

    /// Complete a link from the provider callback, enforcing the
    /// one-provider-account-per-user invariant before persisting.
    ///
    /// Relinking the same user to the same provider account is idempotent
    /// and replaces credentials in place.
    ///
    /// # Errors
    /// - [`LinkError::InvalidState`] / [`LinkError::ExchangeFailed`] from
    ///   the authorization flow
    /// - [`LinkError::AccountConflict`] if the provider account belongs to a
    ///   different user
    pub async fn complete_link(
        &self,
        user_id: Uuid,
        code: &str,
        state: &str,
    ) -> Result<LinkedAccount, LinkError> {
        let completion = self.flow.complete(code, state).await?;

        if let Some(existing) = self
            .store
            .find_by_provider_account(&completion.provider_account_id)
            .await?
        {
            if existing.user_id != user_id {
                return Err(LinkError::AccountConflict {
                    provider_account_id: completion.provider_account_id,
                    existing_user_id: existing.user_id,
                    requested_user_id: user_id,
                });
            }
        }

        let account = self
            .store
            .upsert_link(
                user_id,
                &completion.provider_account_id,
                completion.credentials,
                completion.profile,
            )
            .await
            .map_err(|err| match err {
                // The store's uniqueness check can still fire on a race
                StoreError::ProviderAccountTaken {
                    provider_account_id,
                    existing_user_id,
                } => LinkError::AccountConflict {
                    provider_account_id,
                    existing_user_id,
                    requested_user_id: user_id,
                },
                other => other.into(),
            })?;

        info!(
            %user_id,
            provider = self.provider.name(),
            provider_account_id = %account.provider_account_id,
            "provider account linked"
        );

        Ok(account)
    }

    /// Ensure a valid access token exists for the user and return it.
    ///
    /// # Errors
    /// See [`ConnectionGuard::ensure_valid`]
    pub async fn ensure_valid(&self, user_id: Uuid) -> Result<String, LinkError> {
        self.guard.ensure_valid(user_id).await
    }

    /// Disconnect the provider: best-effort remote revocation, then clear
    /// local credentials. Local disconnection succeeds even when the
    /// provider is unreachable.
    ///
    /// # Errors
    /// Returns [`LinkError::Storage`] only on a local persistence failure
    pub async fn disconnect(&self, user_id: Uuid) -> Result<(), LinkError> {
        self.revoker.revoke(user_id).await
    }

    /// Whether the user currently has a usable provider connection
    ///
    /// # Errors
    /// Returns [`LinkError::Storage`] on a storage failure
    pub async fn connection_status(&self, user_id: Uuid) -> Result<bool, LinkError> {
        Ok(self
            .store
            .get_account(user_id)
            .await?
            .is_some_and(|account| account.usable_credentials().is_some()))
    }

    /// Fetch today's value for a daily metric, handling the
    /// refresh-and-retry-once cycle when the provider rejects a token the
    /// guard considered valid.
    ///
    /// # Errors
    /// - [`LinkError::ConnectionRequired`] / [`LinkError::ReconnectRequired`]
    ///   from the guard (a second token rejection severs the link)
    /// - [`LinkError::ProviderUnavailable`] / [`LinkError::BadRequest`]
    ///   surfaced from the data call
    pub async fn fetch_today_metric(
        &self,
        user_id: Uuid,
        metric: DailyMetric,
    ) -> Result<f64, LinkError> {
        let token = self.guard.ensure_valid(user_id).await?;

        match self.fetch_metric(&token, metric).await {
            Ok(value) => Ok(value),
            Err(ProviderError::TokenInvalid { detail }) => {
                debug!(%user_id, "token rejected on data call despite fresh expiry: {detail}");
                let fresh = self.guard.refresh_after_rejection(user_id, &token).await?;

                match self.fetch_metric(&fresh, metric).await {
                    Ok(value) => Ok(value),
                    Err(ProviderError::TokenInvalid { detail }) => {
                        warn!(%user_id, "token rejected again after refresh, severing link: {detail}");
                        self.guard.sever(user_id).await?;
                        Err(LinkError::ReconnectRequired)
                    }
                    Err(err) => Err(Self::surface(err)),
                }
            }
            Err(err) => Err(Self::surface(err)),
        }
    }

    /// One metric fetch for "today" in the provider's UTC date convention,
    /// with a single previous-day retry when the provider considers the
    /// computed date to be in the future (client clock ahead of the
    /// provider's).
    async fn fetch_metric(&self, token: &str, metric: DailyMetric) -> Result<f64, ProviderError> {
        let today = self.clock.now().date_naive();

        match self.provider.daily_metric(token, metric, today).await {
            Err(err) if err.is_future_date() => {
                let yesterday = today.pred_opt().unwrap_or(today);
                warn!("provider rejected {today} as a future date, retrying with {yesterday}");
                self.provider.daily_metric(token, metric, yesterday).await
            }
            other => other,
        }
    }

    fn surface(err: ProviderError) -> LinkError {
        match err {
            ProviderError::Unavailable { detail } => LinkError::ProviderUnavailable { detail },
            ProviderError::BadRequest { detail } => LinkError::BadRequest { detail },
            // Unrecovered rejections mean the stored link is no longer good
            ProviderError::TokenInvalid { .. } => LinkError::ReconnectRequired,
        }
    }
}
