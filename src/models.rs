// ABOUTME: Core data structures for linked accounts and delegated tokens
// ABOUTME: Token tuples, linked accounts, pending authorizations, wire exchanges
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use crate::constants::time::{DEFAULT_TOKEN_EXPIRY_SECS, TOKEN_REFRESH_WINDOW_SECS};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current delegated-access credentials for one linked account.
///
/// Refresh replaces the tuple wholesale; no history is kept. The refresh
/// token is single-use-rotating: the provider invalidates it on every
/// successful refresh, so whatever tuple a refresh returns must be the one
/// that gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTuple {
    /// Opaque short-lived bearer credential
    pub access_token: String,
    /// Opaque long-lived rotating credential
    pub refresh_token: String,
    /// Absolute expiry computed at issuance; never a relative `expires_in`
    pub expires_at: DateTime<Utc>,
}

impl TokenTuple {
    /// Build a tuple from a raw token-endpoint response, anchoring the
    /// relative `expires_in` to an absolute instant.
    #[must_use]
    pub fn from_exchange(exchange: &TokenExchange, now: DateTime<Utc>) -> Self {
        let lifetime = if exchange.expires_in > 0 {
            exchange.expires_in
        } else {
            DEFAULT_TOKEN_EXPIRY_SECS
        };

        Self {
            access_token: exchange.access_token.clone(),
            refresh_token: exchange.refresh_token.clone(),
            expires_at: now + Duration::seconds(lifetime),
        }
    }

    /// A tuple missing either half is corrupt and treated as not connected
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Check whether the access token is expired or inside the safety window
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(TOKEN_REFRESH_WINDOW_SECS)
    }
}

/// Cached display attributes from the provider.
///
/// Informational only; never consulted for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Display name shown in the hosting application
    pub display_name: String,
    /// Full name, when the provider shares it
    pub full_name: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
}

/// The stored association between an application user and their provider
/// identity plus current credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Owning application-user identifier; immutable once created
    pub user_id: Uuid,
    /// Provider-side account identifier; unique across all linked accounts
    pub provider_account_id: String,
    /// Current token tuple; `None` once disconnected or severed
    pub credentials: Option<TokenTuple>,
    /// Cached provider display attributes
    pub profile: Option<ProviderProfile>,
    /// Record version; increments on every credential write and backs the
    /// compare-and-swap update in the store
    pub version: u64,
}

impl LinkedAccount {
    /// The stored credentials, filtered through the corrupt-tuple rule
    #[must_use]
    pub fn usable_credentials(&self) -> Option<&TokenTuple> {
        self.credentials.as_ref().filter(|c| c.is_usable())
    }
}

/// Ephemeral record of an authorization attempt, keyed by CSRF `state` in
/// the flow's pending map. Single use, 10-minute TTL.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// PKCE verifier whose SHA-256 digest was sent as the challenge
    pub code_verifier: String,
    /// Creation instant, used to expire unclaimed attempts
    pub created_at: DateTime<Utc>,
}

/// Raw result of a token-endpoint call (code exchange or refresh), before
/// expiry anchoring.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    /// Newly issued access token
    pub access_token: String,
    /// Newly issued (rotated) refresh token
    pub refresh_token: String,
    /// Relative lifetime in seconds as reported by the provider
    pub expires_in: i64,
    /// Granted scopes
    pub scope: String,
    /// Provider account identifier; present on the code grant
    pub provider_account_id: Option<String>,
}

/// A started authorization attempt: where to send the user, and the state
/// the callback must echo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Fully formed provider authorization URL
    pub authorization_url: String,
    /// CSRF state embedded in the URL
    pub state: String,
}

/// Everything a completed code exchange yields: the initial tuple plus the
/// provider identity needed to create the link.
#[derive(Debug, Clone)]
pub struct LinkCompletion {
    /// Initial token tuple
    pub credentials: TokenTuple,
    /// Provider account identifier from the token response
    pub provider_account_id: String,
    /// Profile fetched with the new access token
    pub profile: ProviderProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exchange(expires_in: i64) -> TokenExchange {
        TokenExchange {
            access_token: "AT1".into(),
            refresh_token: "RT1".into(),
            expires_in,
            scope: "activity".into(),
            provider_account_id: Some("FB123".into()),
        }
    }

    #[test]
    fn expiry_is_anchored_to_issuance_time_exactly() {
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap();
        let tuple = TokenTuple::from_exchange(&exchange(28_800), issued);

        assert_eq!((tuple.expires_at - issued).num_milliseconds(), 28_800_000);
    }

    #[test]
    fn refresh_window_boundaries() {
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap();
        let tuple = TokenTuple::from_exchange(&exchange(28_800), issued);

        let six_minutes_before = tuple.expires_at - Duration::minutes(6);
        let four_minutes_before = tuple.expires_at - Duration::minutes(4);

        assert!(!tuple.needs_refresh(six_minutes_before));
        assert!(tuple.needs_refresh(four_minutes_before));
        assert!(tuple.needs_refresh(tuple.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn half_present_tuple_is_not_usable() {
        let issued = Utc::now();
        let mut tuple = TokenTuple::from_exchange(&exchange(3600), issued);
        tuple.refresh_token = String::new();

        assert!(!tuple.is_usable());

        let account = LinkedAccount {
            user_id: Uuid::new_v4(),
            provider_account_id: "FB123".into(),
            credentials: Some(tuple),
            profile: None,
            version: 1,
        };
        assert!(account.usable_credentials().is_none());
    }

    #[test]
    fn nonpositive_expires_in_falls_back_to_default_lifetime() {
        let issued = Utc::now();
        let tuple = TokenTuple::from_exchange(&exchange(0), issued);

        assert_eq!(
            (tuple.expires_at - issued).num_seconds(),
            DEFAULT_TOKEN_EXPIRY_SECS
        );
    }
}
