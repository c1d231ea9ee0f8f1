// ABOUTME: Refresh-token rotation with per-account single-flight deduplication
// ABOUTME: Persists via compare-and-swap so an older flight never clobbers a newer tuple
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use crate::clock::Clock;
use crate::errors::LinkError;
use crate::models::TokenTuple;
use crate::providers::{FitnessProvider, ProviderError};
use crate::store::{CredentialStore, StoreError};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Exchanges refresh tokens for new tuples, serializing all refresh work per
/// account.
///
/// The provider rotates the refresh token on every call: two refreshes
/// racing on the same account would each rotate, and whichever tuple loses
/// the write is permanently unusable. The per-account guard makes at most
/// one provider refresh call in flight per account; concurrent callers wait
/// behind it and adopt its result.
pub struct TokenRefresher {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn FitnessProvider>,
    clock: Arc<dyn Clock>,
    in_flight: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl TokenRefresher {
    /// Create a refresher over a store, provider, and clock
    pub fn new(
        store: Arc<dyn CredentialStore>,
        provider: Arc<dyn FitnessProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
            in_flight: DashMap::new(),
        }
    }

    /// Refresh an account's credentials if they are still stale once the
    /// per-account guard is held.
    ///
    /// With `stale_access_token = None` staleness means "inside the expiry
    /// safety window". With `Some(rejected)` it means "the stored access
    /// token is still the one the provider just rejected" — the
    /// refresh-after-401 path replaces even a fresh-looking tuple, but only
    /// when no other flight already replaced it.
    ///
    /// Callers that find the tuple no longer stale receive the current one
    /// without any provider call; this is what bounds N concurrent refresh
    /// attempts to a single provider call.
    ///
    /// # Errors
    /// - [`LinkError::ConnectionRequired`] if no usable credentials exist
    /// - [`LinkError::RefreshFailed`] if the provider rejects the refresh
    ///   token (terminal for the link; severance is the caller's job)
    /// - [`LinkError::ProviderUnavailable`] on transport failure or 5xx; no
    ///   stored state is mutated
    pub async fn refresh_if_stale(
        &self,
        user_id: Uuid,
        stale_access_token: Option<&str>,
    ) -> Result<TokenTuple, LinkError> {
        // Clone the guard out of the map entry so the shard lock is released
        // before any await.
        let gate = self
            .in_flight
            .entry(user_id)
            .or_insert_with(Arc::default)
            .clone();
        let _flight = gate.lock().await;

        let account = self
            .store
            .get_account(user_id)
            .await?
            .ok_or(LinkError::ConnectionRequired)?;
        let current = account
            .usable_credentials()
            .cloned()
            .ok_or(LinkError::ConnectionRequired)?;

        let still_stale = match stale_access_token {
            Some(rejected) => current.access_token == rejected,
            None => current.needs_refresh(self.clock.now()),
        };
        if !still_stale {
            debug!(%user_id, "credentials already refreshed by a concurrent flight");
            return Ok(current);
        }

        let exchange = match self.provider.refresh_token(&current.refresh_token).await {
            Ok(exchange) => exchange,
            Err(ProviderError::Unavailable { detail }) => {
                return Err(LinkError::ProviderUnavailable { detail });
            }
            Err(err) => {
                return Err(LinkError::RefreshFailed {
                    detail: err.to_string(),
                });
            }
        };

        let fresh = TokenTuple::from_exchange(&exchange, self.clock.now());

        match self
            .store
            .swap_credentials(user_id, account.version, Some(fresh.clone()))
            .await
        {
            Ok(_) => {
                info!(%user_id, provider = self.provider.name(), "token refreshed");
                Ok(fresh)
            }
            Err(StoreError::VersionConflict { .. }) => {
                // A flight that started later finished first; its rotation
                // holds the only valid refresh token. Adopt it.
                self.store
                    .get_account(user_id)
                    .await?
                    .and_then(|account| account.usable_credentials().cloned())
                    .ok_or(LinkError::ReconnectRequired)
            }
            Err(err) => Err(err.into()),
        }
    }
}
