// ABOUTME: Read-through account cache layered over any credential store
// ABOUTME: Writes publish the post-write record; reads can never regress a version
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

use super::{CredentialStore, StoreError};
use crate::models::{LinkedAccount, ProviderProfile, TokenTuple};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Read-through cache in front of a durable [`CredentialStore`].
///
/// The cache is an optimization, never the source of truth. Every credential
/// write delegates to the inner store first and then synchronously publishes
/// the post-write record into the cache, so a stale tuple superseded by a
/// refresh is never served to authorize a provider call.
///
/// Publication is version-monotonic: a concurrent read-through that fetched
/// a pre-write record cannot overwrite the newer one.
pub struct CachedCredentialStore {
    inner: Arc<dyn CredentialStore>,
    cache: DashMap<Uuid, LinkedAccount>,
}

impl CachedCredentialStore {
    /// Wrap a store with an account cache
    #[must_use]
    pub fn new(inner: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Insert unless the cache already holds a newer version of the record
    fn publish(&self, account: LinkedAccount) {
        match self.cache.entry(account.user_id) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if account.version >= entry.get().version {
                    entry.insert(account);
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(account);
            }
        }
    }
}

#[async_trait]
impl CredentialStore for CachedCredentialStore {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<LinkedAccount>, StoreError> {
        if let Some(hit) = self.cache.get(&user_id) {
            return Ok(Some(hit.clone()));
        }

        let account = self.inner.get_account(user_id).await?;
        if let Some(account) = &account {
            self.publish(account.clone());
        }
        Ok(account)
    }

    async fn find_by_provider_account(
        &self,
        provider_account_id: &str,
    ) -> Result<Option<LinkedAccount>, StoreError> {
        // Uniqueness checks go to the source of truth
        self.inner.find_by_provider_account(provider_account_id).await
    }

    async fn upsert_link(
        &self,
        user_id: Uuid,
        provider_account_id: &str,
        credentials: TokenTuple,
        profile: ProviderProfile,
    ) -> Result<LinkedAccount, StoreError> {
        let account = self
            .inner
            .upsert_link(user_id, provider_account_id, credentials, profile)
            .await?;
        self.publish(account.clone());
        Ok(account)
    }

    async fn swap_credentials(
        &self,
        user_id: Uuid,
        expected_version: u64,
        credentials: Option<TokenTuple>,
    ) -> Result<LinkedAccount, StoreError> {
        let account = self
            .inner
            .swap_credentials(user_id, expected_version, credentials)
            .await?;
        self.publish(account.clone());
        Ok(account)
    }

    async fn clear_credentials(
        &self,
        user_id: Uuid,
    ) -> Result<Option<LinkedAccount>, StoreError> {
        let account = self.inner.clear_credentials(user_id).await?;
        match &account {
            Some(account) => self.publish(account.clone()),
            None => {
                self.cache.remove(&user_id);
            }
        }
        Ok(account)
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_account(user_id).await?;
        self.cache.remove(&user_id);
        Ok(())
    }
}
