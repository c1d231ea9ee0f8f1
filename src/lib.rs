// ABOUTME: Main library entry point for the fitlink token lifecycle crate
// ABOUTME: Wires account linking, token refresh, revocation, and provider access
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

#![deny(unsafe_code)]

//! # Fitlink
//!
//! OAuth2 account linking and delegated-token lifecycle management for an
//! external fitness-data provider, on behalf of many independent end users of
//! a hosting application.
//!
//! The crate owns the only protocol-stateful part of a fitness integration:
//! obtaining, storing, refreshing, validating, and revoking the bearer tokens
//! the provider issues per linked account. Everything around it (the user
//! store, the HTTP front door, the data pipelines) stays in the host.
//!
//! ## Architecture
//!
//! - **Store**: [`store::CredentialStore`] holds one [`models::LinkedAccount`]
//!   per connected user with versioned, compare-and-swap credential updates
//! - **Flow**: [`oauth::AuthorizationFlow`] runs the PKCE authorization-code
//!   dance and exchanges codes for the initial token tuple
//! - **Refresher**: [`oauth::TokenRefresher`] rotates refresh tokens with
//!   per-account single-flight deduplication
//! - **Revoker**: [`oauth::TokenRevoker`] best-effort remote revocation plus
//!   unconditional local disconnect
//! - **Provider**: [`providers::FitnessProvider`] abstracts the remote HTTP
//!   surface; [`providers::FitbitProvider`] implements it
//! - **Guard**: [`guard::ConnectionGuard`] fronts every protected operation
//!   and keeps the stored tuple usable or severs the link
//! - **Facade**: [`manager::LinkManager`] is the single entry point hosts
//!   embed
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fitlink::config::FitbitConfig;
//! use fitlink::manager::LinkManager;
//! use fitlink::providers::FitbitProvider;
//! use fitlink::store::MemoryCredentialStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FitbitConfig::from_env()?;
//! let manager = LinkManager::new(
//!     Arc::new(MemoryCredentialStore::new()),
//!     Arc::new(FitbitProvider::new(config)),
//! );
//!
//! let user_id = uuid::Uuid::new_v4();
//! let request = manager.begin_link(user_id).await?;
//! println!("visit {}", request.authorization_url);
//! # Ok(())
//! # }
//! ```

/// Injectable time source for expiry math and pending-authorization TTLs
pub mod clock;

/// Provider application credentials and endpoint configuration
pub mod config;

/// Crate-wide constant values (time windows, provider endpoints)
pub mod constants;

/// Crate-level error taxonomy for link lifecycle operations
pub mod errors;

/// Request-path connection state machine guarding protected operations
pub mod guard;

/// Logging configuration for hosting applications
pub mod logging;

/// Facade composing the flow, refresher, revoker, and guard
pub mod manager;

/// Core data structures: token tuples, linked accounts, pending authorizations
pub mod models;

/// OAuth2 flows: PKCE, authorization, refresh, revocation
pub mod oauth;

/// Fitness provider trait and HTTP implementations
pub mod providers;

/// Credential storage trait, in-memory store, and read-through cache
pub mod store;

/// Shared utilities (HTTP client construction)
pub mod utils;

pub use clock::{Clock, SystemClock};
pub use errors::LinkError;
pub use manager::LinkManager;
pub use models::{LinkedAccount, TokenTuple};
