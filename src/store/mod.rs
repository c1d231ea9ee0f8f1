// ABOUTME: Credential storage trait with versioned compare-and-swap updates
// ABOUTME: The linked-account record is the only shared mutable resource in the crate
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! # Credential Storage
//!
//! [`CredentialStore`] is the seam to whatever durable storage the hosting
//! application uses. Implementations must provide atomic, versioned
//! credential updates: a refresh started against a known-old tuple must not
//! clobber a newer tuple written by a refresh that started later but
//! finished first. The `version` field on [`LinkedAccount`] is the
//! compare-and-swap token.
//!
//! [`MemoryCredentialStore`] serves tests and single-node deployments;
//! [`CachedCredentialStore`] layers a read-through cache over any store with
//! synchronous invalidation on every write.

mod cached;
mod memory;

pub use cached::CachedCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::models::{LinkedAccount, ProviderProfile, TokenTuple};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No linked account exists for the user
    #[error("no linked account for user {user_id}")]
    AccountNotFound {
        /// User whose account was requested
        user_id: Uuid,
    },

    /// A conditional update lost the race against a concurrent writer
    #[error("version conflict for user {user_id}: expected {expected}, found {found}")]
    VersionConflict {
        /// User whose account was being updated
        user_id: Uuid,
        /// Version the writer expected
        expected: u64,
        /// Version actually stored
        found: u64,
    },

    /// The provider account is already linked to a different user
    #[error("provider account {provider_account_id} already linked to user {existing_user_id}")]
    ProviderAccountTaken {
        /// Provider account identifier in dispute
        provider_account_id: String,
        /// User currently holding the link
        existing_user_id: Uuid,
    },

    /// Backing-store failure
    #[error("backend storage failure: {detail}")]
    Backend {
        /// Backend error detail
        detail: String,
    },
}

/// Per-account credential storage with optimistic concurrency.
///
/// Reads may run concurrently; credential writes for the same account are
/// serialized by the version check. Durable implementations live in the
/// hosting application; this crate ships the in-memory and cached layers.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the linked account for a user, if any
    async fn get_account(&self, user_id: Uuid) -> Result<Option<LinkedAccount>, StoreError>;

    /// Look up the account holding a provider account id, if any
    async fn find_by_provider_account(
        &self,
        provider_account_id: &str,
    ) -> Result<Option<LinkedAccount>, StoreError>;

    /// Create or replace a user's link after a completed authorization.
    ///
    /// Must reject linking a provider account already held by a different
    /// user with [`StoreError::ProviderAccountTaken`]. Relinking the same
    /// user to the same provider account replaces credentials and profile.
    async fn upsert_link(
        &self,
        user_id: Uuid,
        provider_account_id: &str,
        credentials: TokenTuple,
        profile: ProviderProfile,
    ) -> Result<LinkedAccount, StoreError>;

    /// Conditionally replace the credentials for an account.
    ///
    /// Succeeds only when `expected_version` matches the stored version;
    /// increments the version on success and returns the updated record.
    /// Passing `None` clears the credentials.
    async fn swap_credentials(
        &self,
        user_id: Uuid,
        expected_version: u64,
        credentials: Option<TokenTuple>,
    ) -> Result<LinkedAccount, StoreError>;

    /// Unconditionally clear the credentials (and cached profile) for an
    /// account, retaining the record itself.
    ///
    /// Idempotent: clearing an absent account succeeds with `None`. Returns
    /// the post-clear record so cache layers can publish it.
    async fn clear_credentials(&self, user_id: Uuid)
        -> Result<Option<LinkedAccount>, StoreError>;

    /// Delete the account record entirely (owning application account was
    /// deleted). Idempotent.
    async fn delete_account(&self, user_id: Uuid) -> Result<(), StoreError>;
}
