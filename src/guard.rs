// ABOUTME: Request-path connection state machine guarding protected operations
// ABOUTME: Consolidates token checks so call sites never re-implement refresh logic
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! # Connection Guard
//!
//! Every operation that needs provider data goes through
//! [`ConnectionGuard::ensure_valid`] first. The per-request states:
//!
//! - **NoConnection** — no account or unusable tuple: fail closed with
//!   [`LinkError::ConnectionRequired`], no network call
//! - **Valid** — expiry more than the safety window out: proceed
//! - **NeedsRefresh** — inside the window or expired: refresh, persist,
//!   proceed
//! - **Severed** — refresh rejected: clear local credentials (the tokens are
//!   already dead provider-side, so remote revocation is skipped) and fail
//!   with [`LinkError::ReconnectRequired`]
//!
//! Severance is persisted before the error returns, so no later request can
//! observe a stale "still valid" state.

use crate::clock::Clock;
use crate::errors::LinkError;
use crate::oauth::TokenRefresher;
use crate::store::CredentialStore;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Fronts protected operations with the connection state machine
pub struct ConnectionGuard {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<TokenRefresher>,
    clock: Arc<dyn Clock>,
}

impl ConnectionGuard {
    /// Create a guard over a store, refresher, and clock
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<TokenRefresher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            refresher,
            clock,
        }
    }

    /// Ensure a valid, non-expiring-soon access token exists and return it.
    ///
    /// # Errors
    /// - [`LinkError::ConnectionRequired`] if no usable credentials exist
    /// - [`LinkError::ReconnectRequired`] if a needed refresh was rejected
    ///   (the link is severed before returning)
    /// - [`LinkError::ProviderUnavailable`] on transient failure; stored
    ///   state is untouched and the caller may retry
    pub async fn ensure_valid(&self, user_id: Uuid) -> Result<String, LinkError> {
        let account = self
            .store
            .get_account(user_id)
            .await?
            .ok_or(LinkError::ConnectionRequired)?;
        let credentials = account
            .usable_credentials()
            .ok_or(LinkError::ConnectionRequired)?;

        if !credentials.needs_refresh(self.clock.now()) {
            return Ok(credentials.access_token.clone());
        }

        match self.refresher.refresh_if_stale(user_id, None).await {
            Ok(fresh) => Ok(fresh.access_token),
            Err(LinkError::RefreshFailed { detail }) => {
                warn!(%user_id, "refresh rejected, severing link: {detail}");
                self.sever(user_id).await?;
                Err(LinkError::ReconnectRequired)
            }
            Err(err) => Err(err),
        }
    }

    /// Refresh after the provider rejected `rejected_token` on a data call
    /// the guard had considered valid (clock skew, provider-side early
    /// expiry, concurrent revocation elsewhere).
    ///
    /// # Errors
    /// Same contract as [`ConnectionGuard::ensure_valid`]
    pub async fn refresh_after_rejection(
        &self,
        user_id: Uuid,
        rejected_token: &str,
    ) -> Result<String, LinkError> {
        match self
            .refresher
            .refresh_if_stale(user_id, Some(rejected_token))
            .await
        {
            Ok(fresh) => Ok(fresh.access_token),
            Err(LinkError::RefreshFailed { detail }) => {
                warn!(%user_id, "refresh after token rejection failed, severing link: {detail}");
                self.sever(user_id).await?;
                Err(LinkError::ReconnectRequired)
            }
            Err(err) => Err(err),
        }
    }

    /// Clear local credentials after an irrecoverable failure.
    ///
    /// The remote tokens are already invalid provider-side, so no
    /// revocation calls are made.
    ///
    /// # Errors
    /// Returns [`LinkError::Storage`] if the clear cannot be persisted
    pub async fn sever(&self, user_id: Uuid) -> Result<(), LinkError> {
        self.store.clear_credentials(user_id).await?;
        Ok(())
    }
}
