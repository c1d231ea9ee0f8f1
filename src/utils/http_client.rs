// ABOUTME: HTTP client construction with purpose-specific timeout profiles
// ABOUTME: Every outbound provider call is bounded; a timeout surfaces as unavailable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Create a new HTTP client with custom timeout settings
///
/// # Returns
/// A new `reqwest::Client` with the given timeouts, or a default client if
/// construction fails
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a new HTTP client optimized for OAuth flows
///
/// Token exchanges should be fast operations; this client uses short
/// timeouts so a slow token endpoint surfaces promptly as unavailable.
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(15, 5)
}

/// Create a new HTTP client optimized for resource API calls
///
/// Resource endpoints can take longer to aggregate data; this client allows
/// more headroom while still bounding every request.
#[must_use]
pub fn api_client() -> Client {
    create_client_with_timeout(60, 10)
}
