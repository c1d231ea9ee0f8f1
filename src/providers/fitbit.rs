// ABOUTME: Fitbit HTTP provider: authorization, token endpoint, profile, daily series
// ABOUTME: Classifies every non-2xx response into token-invalid, bad-request, or unavailable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! Fitbit Web API implementation of [`FitnessProvider`].
//!
//! # API Documentation
//! - [Fitbit Web API](https://dev.fitbit.com/build/reference/web-api/)
//! - [OAuth2 Authorization](https://dev.fitbit.com/build/reference/web-api/developer-guide/authorization/)

use super::{DailyMetric, FitnessProvider, ProviderError, TokenTypeHint};
use crate::config::FitbitConfig;
use crate::models::{ProviderProfile, TokenExchange};
use crate::oauth::PkceParams;
use crate::utils::http_client::{api_client, oauth_client};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// Fitbit provider over the public Web API (endpoints overridable via
/// [`FitbitConfig`])
pub struct FitbitProvider {
    config: FitbitConfig,
    oauth_client: Client,
    api_client: Client,
}

impl FitbitProvider {
    /// Create a provider for the given application registration
    #[must_use]
    pub fn new(config: FitbitConfig) -> Self {
        Self {
            config,
            oauth_client: oauth_client(),
            api_client: api_client(),
        }
    }

    fn basic_auth(&self) -> String {
        let credentials = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        format!("Basic {credentials}")
    }

    /// POST to the token endpoint with client Basic auth and decode the
    /// standard token response
    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenExchange, ProviderError> {
        let response = self
            .oauth_client
            .post(&self.config.token_url)
            .header("Authorization", self.basic_auth())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        let token: FitbitTokenResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::BadRequest {
                detail: format!("malformed token response: {e}"),
            })?;

        Ok(TokenExchange {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            scope: token.scope,
            provider_account_id: token.user_id,
        })
    }
}

#[async_trait]
impl FitnessProvider for FitbitProvider {
    fn name(&self) -> &'static str {
        "fitbit"
    }

    fn authorization_url(
        &self,
        state: &str,
        pkce: &PkceParams,
    ) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.config.auth_url).map_err(|e| ProviderError::BadRequest {
            detail: format!("invalid authorization URL: {e}"),
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method);

        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenExchange, ProviderError> {
        self.token_request(&[
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenExchange, ProviderError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<(), ProviderError> {
        let response = self
            .oauth_client
            .post(&self.config.revoke_url)
            .header("Authorization", self.basic_auth())
            .form(&[("token", token), ("token_type_hint", hint.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(classify_error(status, &body));
        }

        Ok(())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, ProviderError> {
        let response = self
            .api_client
            .get(format!("{}/user/-/profile.json", self.config.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        let profile: FitbitProfileResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::BadRequest {
                detail: format!("malformed profile response: {e}"),
            })?;

        Ok(ProviderProfile {
            display_name: profile.user.display_name,
            full_name: profile.user.full_name,
            avatar: profile.user.avatar,
        })
    }

    async fn daily_metric(
        &self,
        access_token: &str,
        metric: DailyMetric,
        date: NaiveDate,
    ) -> Result<f64, ProviderError> {
        let resource = metric.resource();
        let url = format!(
            "{}/user/-/activities/{resource}/date/{}/1d.json",
            self.config.api_base,
            date.format("%Y-%m-%d")
        );

        let response = self.api_client.get(url).bearer_auth(access_token).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        parse_series_value(resource, &body)
    }
}

// Fitbit API response structures

#[derive(Debug, Deserialize)]
struct FitbitTokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    scope: String,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FitbitProfileResponse {
    user: FitbitUserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FitbitUserProfile {
    display_name: String,
    full_name: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FitbitErrorBody {
    #[serde(default)]
    errors: Vec<FitbitErrorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FitbitErrorEntry {
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    value: String,
}

/// Classify a non-2xx provider response.
///
/// Token-invalid detection follows Fitbit's structured error body
/// (`errorType` of `expired_token`/`invalid_token`) with a fallback for a
/// 401 carrying an expiry-related message.
fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    if status.is_server_error() {
        return ProviderError::Unavailable {
            detail: format!("provider returned {status}"),
        };
    }

    let parsed: Option<FitbitErrorBody> = serde_json::from_str(body).ok();

    let detail = parsed
        .as_ref()
        .and_then(|b| b.errors.first())
        .map_or_else(
            || format!("provider returned {status}"),
            |e| format!("{}: {}", e.error_type, e.message),
        );

    let structured_token_error = parsed.as_ref().is_some_and(|b| {
        b.errors
            .iter()
            .any(|e| matches!(e.error_type.as_str(), "expired_token" | "invalid_token"))
    });

    let unauthorized_expiry = status == StatusCode::UNAUTHORIZED && {
        let lower = body.to_lowercase();
        lower.contains("expired") || lower.contains("invalid_token")
    };

    if structured_token_error || unauthorized_expiry {
        ProviderError::TokenInvalid { detail }
    } else {
        ProviderError::BadRequest { detail }
    }
}

/// Extract the single value from a one-day activity series.
///
/// An empty series is a day with no data and reads as `0`; a value that
/// fails numeric parsing is a hard error, since coercing it to zero would
/// mask a provider contract violation.
fn parse_series_value(resource: &str, body: &str) -> Result<f64, ProviderError> {
    let series: HashMap<String, Vec<SeriesEntry>> =
        serde_json::from_str(body).map_err(|e| ProviderError::BadRequest {
            detail: format!("malformed series response: {e}"),
        })?;

    let key = format!("activities-{resource}");
    let entries = series.get(&key).ok_or_else(|| ProviderError::BadRequest {
        detail: format!("series response missing {key}"),
    })?;

    let Some(entry) = entries.first() else {
        return Ok(0.0);
    };

    entry
        .value
        .parse::<f64>()
        .map_err(|_| ProviderError::BadRequest {
            detail: format!("non-numeric value {:?} in {key} series", entry.value),
        })
}
