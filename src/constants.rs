// ABOUTME: Crate-wide constant values for token lifecycle management
// ABOUTME: Time windows, provider endpoint defaults, and PKCE parameters
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! Constants module

/// Time-related constants
pub mod time {
    /// A token whose expiry is within this window is refreshed before use.
    ///
    /// Generous enough that a refresh started just inside the window finishes
    /// (provider latency, clock skew) before the old access token is needed.
    pub const TOKEN_REFRESH_WINDOW_SECS: i64 = 300;

    /// Unclaimed pending authorizations expire after this long
    pub const PENDING_AUTH_TTL_SECS: i64 = 600;

    /// Fallback access-token lifetime when the provider omits `expires_in`
    pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 28_800;
}

/// OAuth endpoint defaults and flow parameters
pub mod oauth {
    /// Fitbit authorization endpoint (redirect-based)
    pub const FITBIT_AUTH_URL: &str = "https://www.fitbit.com/oauth2/authorize";

    /// Fitbit token endpoint (code exchange and refresh)
    pub const FITBIT_TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";

    /// Fitbit token revocation endpoint
    pub const FITBIT_REVOKE_URL: &str = "https://api.fitbit.com/oauth2/revoke";

    /// Base URL for Fitbit resource endpoints
    pub const FITBIT_API_BASE: &str = "https://api.fitbit.com/1";

    /// Default scopes requested at authorization time
    pub const FITBIT_DEFAULT_SCOPES: &str =
        "activity heartrate location nutrition profile settings sleep social weight";

    /// Length of the generated PKCE code verifier (RFC 7636 allows 43-128)
    pub const CODE_VERIFIER_LENGTH: usize = 64;
}
