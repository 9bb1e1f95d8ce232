//! In-memory credential store.
//!
//! Backs local runs without a database and the crate's own tests. Every
//! operation takes the map lock once, so `record_authentication` is atomic
//! with respect to other calls.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;

use latchkey_core::{Email, UserId};

use super::{CredentialRegistry, CredentialStore, StoreError};
use crate::db::RepositoryError;
use crate::models::Credential;

#[derive(Default)]
struct Inner {
    by_identifier: HashMap<String, Credential>,
    next_id: i32,
}

/// Map-backed [`CredentialStore`] and [`CredentialRegistry`].
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered credentials.
    pub async fn count(&self) -> usize {
        self.inner.read().await.by_identifier.len()
    }

    /// Fetch a credential by identifier, for inspection.
    pub async fn get(&self, identifier: &str) -> Option<Credential> {
        self.inner.read().await.by_identifier.get(identifier).cloned()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self.get(identifier).await)
    }

    async fn record_authentication(
        &self,
        credential: &Credential,
        at: DateTime<Utc>,
    ) -> Result<Credential, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .by_identifier
            .get_mut(credential.email.as_str())
            .filter(|stored| stored.id == credential.id)
            .ok_or(StoreError::Repository(RepositoryError::NotFound))?;

        stored.last_authenticated_at = Some(at);
        stored.sign_in_count += 1;
        Ok(stored.clone())
    }
}

#[async_trait]
impl CredentialRegistry for InMemoryCredentialStore {
    async fn create(&self, identifier: &Email, secret_hash: &str) -> Result<Credential, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_identifier.contains_key(identifier.as_str()) {
            return Err(StoreError::Conflict);
        }

        inner.next_id += 1;
        let credential = Credential::new(
            UserId::new(inner.next_id),
            identifier.clone(),
            SecretString::from(secret_hash),
            None,
            0,
            Utc::now(),
        );
        inner
            .by_identifier
            .insert(identifier.as_str().to_owned(), credential.clone());

        Ok(credential)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryCredentialStore::new();
        let a = store
            .create(&Email::parse("a@example.com").unwrap(), "hash-a")
            .await
            .unwrap();
        let b = store
            .create(&Email::parse("b@example.com").unwrap(), "hash-b")
            .await
            .unwrap();

        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_identifier() {
        let store = InMemoryCredentialStore::new();
        let email = Email::parse("a@example.com").unwrap();
        store.create(&email, "hash").await.unwrap();

        assert!(matches!(
            store.create(&email, "hash").await,
            Err(StoreError::Conflict)
        ));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_record_authentication_updates_tracking() {
        let store = InMemoryCredentialStore::new();
        let credential = store
            .create(&Email::parse("a@example.com").unwrap(), "hash")
            .await
            .unwrap();

        let at = Utc::now();
        let updated = store.record_authentication(&credential, at).await.unwrap();
        assert_eq!(updated.last_authenticated_at, Some(at));
        assert_eq!(updated.sign_in_count, 1);

        let stored = store.get("a@example.com").await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_lookup_is_exact() {
        let store = InMemoryCredentialStore::new();
        store
            .create(&Email::parse("a@example.com").unwrap(), "hash")
            .await
            .unwrap();

        assert!(store.find_by_identifier("A@example.com").await.unwrap().is_none());
        assert!(store.find_by_identifier("a@example.com").await.unwrap().is_some());
    }
}
