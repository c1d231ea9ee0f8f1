// ABOUTME: Crate-level error taxonomy for link lifecycle operations
// ABOUTME: Distinguishes setup, re-authorization, transient, and conflict outcomes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! # Link Error Taxonomy
//!
//! Every fallible lifecycle operation returns [`LinkError`]. The variants are
//! deliberate surface contracts, not implementation details:
//!
//! - `ConnectionRequired` vs `ReconnectRequired` are distinct outcomes a host
//!   should present differently (first-time setup vs re-authorization after a
//!   lapse)
//! - `ProviderUnavailable` is the only retryable variant and never mutates
//!   stored credential state
//! - `RefreshFailed` is terminal for the current link and always accompanied
//!   by a persisted severance before it is returned

use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by link lifecycle operations
#[derive(Debug, Error)]
pub enum LinkError {
    /// No provider account is linked (or the stored tuple is corrupt); the
    /// protected operation was rejected without any network call
    #[error("no provider connection exists for this account")]
    ConnectionRequired,

    /// The link was severed (refresh rejected, or repeated token-invalid
    /// responses); the user must re-authorize
    #[error("provider connection lost; re-authorization required")]
    ReconnectRequired,

    /// The callback carried an unknown, reused, or expired state parameter
    #[error("invalid or expired authorization state")]
    InvalidState,

    /// The authorization-code exchange failed; codes are single-use, so the
    /// whole authorization attempt must be restarted
    #[error("authorization code exchange failed: {detail}")]
    ExchangeFailed {
        /// Provider error detail
        detail: String,
    },

    /// The provider account is already linked to a different user
    #[error("provider account {provider_account_id} is already linked to user {existing_user_id}")]
    AccountConflict {
        /// Provider-side account identifier in dispute
        provider_account_id: String,
        /// User currently holding the link
        existing_user_id: Uuid,
        /// User whose link attempt was rejected
        requested_user_id: Uuid,
    },

    /// The provider rejected the refresh token (already rotated, revoked, or
    /// expired); terminal for the current link
    #[error("token refresh rejected by provider: {detail}")]
    RefreshFailed {
        /// Provider error detail
        detail: String,
    },

    /// Transport failure, timeout, or provider 5xx; safe to retry later
    #[error("provider temporarily unavailable: {detail}")]
    ProviderUnavailable {
        /// Transport or provider error detail
        detail: String,
    },

    /// The provider rejected the request for a non-token reason; indicates a
    /// malformed request, not a credential problem
    #[error("provider rejected the request: {detail}")]
    BadRequest {
        /// Provider error detail
        detail: String,
    },

    /// Credential storage failure
    #[error("credential storage error")]
    Storage(#[from] StoreError),
}
