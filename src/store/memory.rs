// ABOUTME: In-memory credential store with versioned compare-and-swap updates
// ABOUTME: Serves tests and single-node deployments; durable stores live in the host
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use super::{CredentialStore, StoreError};
use crate::models::{LinkedAccount, ProviderProfile, TokenTuple};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory [`CredentialStore`] backed by a `RwLock`-guarded map.
///
/// Enforces provider-account uniqueness and version-checked credential
/// swaps, mirroring the unique-index plus conditional-update contract a
/// durable implementation provides.
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: RwLock<HashMap<Uuid, LinkedAccount>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<LinkedAccount>, StoreError> {
        Ok(self.accounts.read().await.get(&user_id).cloned())
    }

    async fn find_by_provider_account(
        &self,
        provider_account_id: &str,
    ) -> Result<Option<LinkedAccount>, StoreError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.provider_account_id == provider_account_id)
            .cloned())
    }

    async fn upsert_link(
        &self,
        user_id: Uuid,
        provider_account_id: &str,
        credentials: TokenTuple,
        profile: ProviderProfile,
    ) -> Result<LinkedAccount, StoreError> {
        let mut accounts = self.accounts.write().await;

        if let Some(existing) = accounts
            .values()
            .find(|account| account.provider_account_id == provider_account_id)
        {
            if existing.user_id != user_id {
                return Err(StoreError::ProviderAccountTaken {
                    provider_account_id: provider_account_id.to_owned(),
                    existing_user_id: existing.user_id,
                });
            }
        }

        let account = accounts
            .entry(user_id)
            .and_modify(|account| {
                account.provider_account_id = provider_account_id.to_owned();
                account.credentials = Some(credentials.clone());
                account.profile = Some(profile.clone());
                account.version += 1;
            })
            .or_insert_with(|| LinkedAccount {
                user_id,
                provider_account_id: provider_account_id.to_owned(),
                credentials: Some(credentials.clone()),
                profile: Some(profile.clone()),
                version: 1,
            });

        Ok(account.clone())
    }

    async fn swap_credentials(
        &self,
        user_id: Uuid,
        expected_version: u64,
        credentials: Option<TokenTuple>,
    ) -> Result<LinkedAccount, StoreError> {
        let mut accounts = self.accounts.write().await;

        let account = accounts
            .get_mut(&user_id)
            .ok_or(StoreError::AccountNotFound { user_id })?;

        if account.version != expected_version {
            return Err(StoreError::VersionConflict {
                user_id,
                expected: expected_version,
                found: account.version,
            });
        }

        account.credentials = credentials;
        account.version += 1;

        Ok(account.clone())
    }

    async fn clear_credentials(
        &self,
        user_id: Uuid,
    ) -> Result<Option<LinkedAccount>, StoreError> {
        let mut accounts = self.accounts.write().await;

        Ok(accounts.get_mut(&user_id).map(|account| {
            account.credentials = None;
            account.profile = None;
            account.version += 1;
            account.clone()
        }))
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.accounts.write().await.remove(&user_id);
        Ok(())
    }
}
