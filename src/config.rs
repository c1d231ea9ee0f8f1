// ABOUTME: Provider application credentials and endpoint configuration
// ABOUTME: Environment-first loading with overridable endpoint URLs for tests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use crate::constants::oauth;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Fitbit application registration and endpoint configuration.
///
/// Endpoint URLs default to the public Fitbit API and are plain fields so
/// tests and proxies can point the provider elsewhere.
#[derive(Debug, Clone)]
pub struct FitbitConfig {
    /// OAuth client ID issued at app registration
    pub client_id: String,
    /// OAuth client secret issued at app registration
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Scopes requested at authorization time
    pub scopes: Vec<String>,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint (code exchange and refresh)
    pub token_url: String,
    /// Revocation endpoint
    pub revoke_url: String,
    /// Base URL for resource endpoints
    pub api_base: String,
}

impl FitbitConfig {
    /// Build a configuration with default endpoints and scopes
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            scopes: oauth::FITBIT_DEFAULT_SCOPES
                .split(' ')
                .map(str::to_owned)
                .collect(),
            auth_url: oauth::FITBIT_AUTH_URL.to_owned(),
            token_url: oauth::FITBIT_TOKEN_URL.to_owned(),
            revoke_url: oauth::FITBIT_REVOKE_URL.to_owned(),
            api_base: oauth::FITBIT_API_BASE.to_owned(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Reads `FITBIT_CLIENT_ID`, `FITBIT_CLIENT_SECRET`, and (optionally)
    /// `FITBIT_REDIRECT_URI`.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingVar`] when a required variable is absent
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = std::env::var("FITBIT_CLIENT_ID")
            .map_err(|_| ConfigError::MissingVar("FITBIT_CLIENT_ID"))?;
        let client_secret = std::env::var("FITBIT_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingVar("FITBIT_CLIENT_SECRET"))?;
        let redirect_uri = std::env::var("FITBIT_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8081/api/link/callback".to_owned());

        Ok(Self::new(client_id, client_secret, redirect_uri))
    }
}
