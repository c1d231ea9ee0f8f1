// ABOUTME: Fitness provider abstraction over the remote OAuth and resource endpoints
// ABOUTME: Object-safe trait so tests run against scripted provider doubles
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! # Provider Abstraction
//!
//! [`FitnessProvider`] covers every remote call the token lifecycle makes:
//! authorization-URL construction, code exchange, refresh, revocation,
//! profile fetch, and date-keyed daily metrics. [`FitbitProvider`] is the
//! HTTP implementation; tests substitute scripted doubles.

pub mod errors;
mod fitbit;

pub use errors::ProviderError;
pub use fitbit::FitbitProvider;

use crate::models::{ProviderProfile, TokenExchange};
use crate::oauth::PkceParams;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Which token a revocation call is naming, passed as `token_type_hint`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTypeHint {
    /// Revoke an access token
    AccessToken,
    /// Revoke a refresh token
    RefreshToken,
}

impl TokenTypeHint {
    /// Wire value for the `token_type_hint` form field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Daily activity aggregates the integration reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyMetric {
    /// Step count for the day
    Steps,
    /// Calories burned for the day
    Calories,
    /// Distance covered for the day
    Distance,
}

impl DailyMetric {
    /// Resource path segment in the provider's activity-series endpoints
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Calories => "calories",
            Self::Distance => "distance",
        }
    }
}

/// Remote provider operations used by the token lifecycle
#[async_trait]
pub trait FitnessProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Build the redirect-based authorization URL for a flow attempt
    ///
    /// # Errors
    /// Returns an error if the configured authorization URL is malformed
    fn authorization_url(&self, state: &str, pkce: &PkceParams)
        -> Result<String, ProviderError>;

    /// Exchange an authorization code (plus PKCE verifier) for tokens
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenExchange, ProviderError>;

    /// Exchange a refresh token for a new token pair; the provider rotates
    /// the refresh token on every call
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenExchange, ProviderError>;

    /// Revoke a single token at the provider
    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<(), ProviderError>;

    /// Fetch the account profile with a bearer token
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, ProviderError>;

    /// Fetch a single day's aggregate value for a metric
    async fn daily_metric(
        &self,
        access_token: &str,
        metric: DailyMetric,
        date: NaiveDate,
    ) -> Result<f64, ProviderError>;
}
