// ABOUTME: Structured error types for provider HTTP operations
// ABOUTME: Classifies responses into token-invalid, bad-request, and unavailable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use thiserror::Error;

/// Errors from provider HTTP calls.
///
/// Only [`ProviderError::TokenInvalid`] triggers a refresh-and-retry
/// upstream; the other variants are surfaced as-is.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider reports the bearer token is expired or invalid
    #[error("provider reports the access token is invalid: {detail}")]
    TokenInvalid {
        /// Provider error detail
        detail: String,
    },

    /// Any other 4xx: a malformed request or contract violation, not a
    /// token problem
    #[error("provider rejected the request: {detail}")]
    BadRequest {
        /// Provider error detail
        detail: String,
    },

    /// 5xx, transport failure, or timeout; transient
    #[error("provider unavailable: {detail}")]
    Unavailable {
        /// Transport or provider error detail
        detail: String,
    },
}

impl ProviderError {
    /// Whether this is the provider refusing a date it considers to be in
    /// the future (client clock ahead of the provider's notion of "today")
    #[must_use]
    pub fn is_future_date(&self) -> bool {
        matches!(self, Self::BadRequest { detail } if detail.to_lowercase().contains("future"))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable {
            detail: err.to_string(),
        }
    }
}
