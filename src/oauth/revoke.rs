// ABOUTME: Token revocation and local disconnect
// ABOUTME: Remote revocation is best effort; clearing local credentials always succeeds
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use crate::errors::LinkError;
use crate::providers::{FitnessProvider, TokenTypeHint};
use crate::store::CredentialStore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Invalidates tokens with the provider and clears local credentials.
///
/// Each remote revocation call is independent: failing to revoke one token
/// does not block revoking the other, and failing both does not block the
/// local disconnect. A user who asks to disconnect must end up disconnected
/// even when the provider is unreachable.
pub struct TokenRevoker {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn FitnessProvider>,
}

impl TokenRevoker {
    /// Create a revoker over a store and provider
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn FitnessProvider>) -> Self {
        Self { store, provider }
    }

    /// Revoke both tokens remotely (best effort) and clear the stored
    /// credentials.
    ///
    /// # Errors
    /// Returns [`LinkError::Storage`] only if clearing local credentials
    /// fails; remote revocation failures are logged and swallowed
    pub async fn revoke(&self, user_id: Uuid) -> Result<(), LinkError> {
        if let Some(account) = self.store.get_account(user_id).await? {
            if let Some(credentials) = &account.credentials {
                let tokens = [
                    (&credentials.access_token, TokenTypeHint::AccessToken),
                    (&credentials.refresh_token, TokenTypeHint::RefreshToken),
                ];
                for (token, hint) in tokens {
                    if token.is_empty() {
                        continue;
                    }
                    if let Err(err) = self.provider.revoke_token(token, hint).await {
                        warn!(
                            %user_id,
                            token_type = hint.as_str(),
                            "provider revocation failed, continuing with local disconnect: {err}"
                        );
                    }
                }
            }
        }

        self.store.clear_credentials(user_id).await?;
        info!(%user_id, provider = self.provider.name(), "provider disconnected");
        Ok(())
    }
}
