// ABOUTME: Authorization-code flow with CSRF state and PKCE
// ABOUTME: Pending attempts are single-use, TTL-bounded, and swept on every call
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use super::PkceParams;
use crate::clock::Clock;
use crate::constants::time::PENDING_AUTH_TTL_SECS;
use crate::errors::LinkError;
use crate::models::{AuthorizationRequest, LinkCompletion, PendingAuthorization, TokenTuple};
use crate::providers::FitnessProvider;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Runs the provider authorization dance: hands out authorization URLs and
/// exchanges returned codes for the initial token tuple.
///
/// Pending attempts live in an in-process map keyed by CSRF state. Loss on
/// restart is tolerable (the user restarts the flow); expiry sweeping
/// piggybacks on begin/complete calls, so correctness never depends on a
/// background timer.
pub struct AuthorizationFlow {
    provider: Arc<dyn FitnessProvider>,
    clock: Arc<dyn Clock>,
    pending: RwLock<HashMap<String, PendingAuthorization>>,
}

impl AuthorizationFlow {
    /// Create a flow against a provider and clock
    pub fn new(provider: Arc<dyn FitnessProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Start an authorization attempt.
    ///
    /// Generates state and PKCE material, stores the pending entry, and
    /// returns the fully formed authorization URL. No other side effects.
    ///
    /// # Errors
    /// Returns [`LinkError::BadRequest`] if the authorization URL cannot be
    /// built from the provider configuration
    pub async fn begin(&self) -> Result<AuthorizationRequest, LinkError> {
        let state = Uuid::new_v4().simple().to_string();
        let pkce = PkceParams::generate();

        let authorization_url = self
            .provider
            .authorization_url(&state, &pkce)
            .map_err(|e| LinkError::BadRequest {
                detail: e.to_string(),
            })?;

        let now = self.clock.now();
        {
            let mut pending = self.pending.write().await;
            Self::sweep(&mut pending, now);
            pending.insert(
                state.clone(),
                PendingAuthorization {
                    code_verifier: pkce.code_verifier,
                    created_at: now,
                },
            );
        }

        debug!(provider = self.provider.name(), "authorization attempt started");

        Ok(AuthorizationRequest {
            authorization_url,
            state,
        })
    }

    /// Complete an authorization attempt with the code and state returned by
    /// the provider callback.
    ///
    /// The state is single use: a second completion with the same state, or
    /// a state older than the pending TTL, fails with
    /// [`LinkError::InvalidState`]. Authorization codes are single-use too,
    /// so a failed exchange must restart the whole flow rather than retry.
    ///
    /// # Errors
    /// - [`LinkError::InvalidState`] for unknown, reused, or expired state
    /// - [`LinkError::ExchangeFailed`] for any provider-side or transport
    ///   failure during code exchange or profile fetch
    pub async fn complete(&self, code: &str, state: &str) -> Result<LinkCompletion, LinkError> {
        let now = self.clock.now();

        let verifier = {
            let mut pending = self.pending.write().await;
            // The sweep removes expired entries, so a successful remove
            // below implies the attempt is still within its window.
            Self::sweep(&mut pending, now);
            pending
                .remove(state)
                .ok_or(LinkError::InvalidState)?
                .code_verifier
        };

        let exchange = self
            .provider
            .exchange_code(code, &verifier)
            .await
            .map_err(|e| LinkError::ExchangeFailed {
                detail: e.to_string(),
            })?;

        let credentials = TokenTuple::from_exchange(&exchange, self.clock.now());

        let provider_account_id =
            exchange
                .provider_account_id
                .ok_or_else(|| LinkError::ExchangeFailed {
                    detail: "token response missing provider account id".into(),
                })?;

        let profile = self
            .provider
            .fetch_profile(&credentials.access_token)
            .await
            .map_err(|e| LinkError::ExchangeFailed {
                detail: e.to_string(),
            })?;

        info!(
            provider = self.provider.name(),
            %provider_account_id,
            "authorization completed"
        );

        Ok(LinkCompletion {
            credentials,
            provider_account_id,
            profile,
        })
    }

    /// Number of unclaimed authorization attempts currently pending
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    fn sweep(pending: &mut HashMap<String, PendingAuthorization>, now: DateTime<Utc>) {
        let ttl = Duration::seconds(PENDING_AUTH_TTL_SECS);
        pending.retain(|_, attempt| now - attempt.created_at < ttl);
    }
}
