//! In-process credential store
//!
//! Keeps users and refresh claims in memory. Used by the test suites and
//! for running the server without a database. Unique constraints and the
//! all-or-nothing user creation mirror the PostgreSQL schema.

use super::{
    CredentialStore, NewUser, RefreshClaimRecord, RefreshMinter, StoreError, StoreResult,
    UniqueField, UserRecord,
};
use crate::auth::{Claims, IssuedToken};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    refresh_claims: Vec<RefreshClaimRecord>,
    next_user_id: i64,
    next_claim_id: i64,
}

impl Tables {
    fn insert_claim(&mut self, claims: &Claims) -> RefreshClaimRecord {
        self.next_claim_id += 1;
        let record = RefreshClaimRecord {
            id: self.next_claim_id,
            issuer: claims.iss.clone(),
            issued_at: claims.iat,
            expires_at: claims.exp,
        };
        self.refresh_claims.push(record.clone());
        record
    }
}

/// Credential store held in process memory
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail, as if the database went away
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        self.tables().map(|t| t.users.len()).unwrap_or(0)
    }

    /// Number of stored refresh claims
    pub fn refresh_claim_count(&self) -> usize {
        self.tables().map(|t| t.refresh_claims.len()).unwrap_or(0)
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "credential store unavailable"
            )));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("credential store lock poisoned")))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email_or_username(
        &self,
        identity: &str,
    ) -> StoreResult<Option<UserRecord>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == identity || u.username == identity)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let tables = self.tables()?;
        Ok(tables.users.iter().any(|u| u.email == email))
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        let tables = self.tables()?;
        Ok(tables.users.iter().any(|u| u.username == username))
    }

    async fn create_user_with_refresh_claim(
        &self,
        user: NewUser,
        mint_refresh: RefreshMinter<'_>,
    ) -> StoreResult<(UserRecord, IssuedToken)> {
        let mut tables = self.tables()?;

        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }

        let id = tables.next_user_id + 1;
        let refresh = mint_refresh(id)?;

        let record = UserRecord {
            id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.next_user_id = id;
        tables.users.push(record.clone());
        tables.insert_claim(&refresh.claims);

        Ok((record, refresh))
    }

    async fn create_refresh_claim(&self, claims: &Claims) -> StoreResult<RefreshClaimRecord> {
        let mut tables = self.tables()?;
        Ok(tables.insert_claim(claims))
    }

    async fn find_refresh_claim(
        &self,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> StoreResult<Option<RefreshClaimRecord>> {
        let tables = self.tables()?;
        Ok(tables
            .refresh_claims
            .iter()
            .find(|r| r.matches(issuer, issued_at, expires_at))
            .cloned())
    }

    async fn delete_refresh_claim(
        &self,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> StoreResult<u64> {
        let mut tables = self.tables()?;
        let before = tables.refresh_claims.len();
        tables
            .refresh_claims
            .retain(|r| !r.matches(issuer, issued_at, expires_at));
        Ok((before - tables.refresh_claims.len()) as u64)
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.tables().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_persists_refresh_claim() {
        let store = MemoryCredentialStore::new();
        let jwt = TokenService::new("test-secret", 900, 604800);
        let mint = |id: i64| jwt.issue_refresh_token(&id.to_string());

        let (user, refresh) = store
            .create_user_with_refresh_claim(new_user("a@x.com", "alice"), &mint)
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(refresh.claims.iss, "1");
        let claims = &refresh.claims;
        assert!(store
            .find_refresh_claim(&claims.iss, claims.iat, claims.exp)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_failed_mint_leaves_nothing_behind() {
        let store = MemoryCredentialStore::new();
        let mint = |_: i64| -> anyhow::Result<IssuedToken> { Err(anyhow::anyhow!("boom")) };

        let result = store
            .create_user_with_refresh_claim(new_user("a@x.com", "alice"), &mint)
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.refresh_claim_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryCredentialStore::new();
        let jwt = TokenService::new("test-secret", 900, 604800);
        let mint = |id: i64| jwt.issue_refresh_token(&id.to_string());

        store
            .create_user_with_refresh_claim(new_user("a@x.com", "alice"), &mint)
            .await
            .unwrap();
        let result = store
            .create_user_with_refresh_claim(new_user("b@x.com", "alice"), &mint)
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Duplicate(UniqueField::Username))
        ));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_by_email_or_username() {
        let store = MemoryCredentialStore::new();
        let jwt = TokenService::new("test-secret", 900, 604800);
        let mint = |id: i64| jwt.issue_refresh_token(&id.to_string());

        store
            .create_user_with_refresh_claim(new_user("a@x.com", "alice"), &mint)
            .await
            .unwrap();

        assert!(store.find_user_by_email_or_username("a@x.com").await.unwrap().is_some());
        assert!(store.find_user_by_email_or_username("alice").await.unwrap().is_some());
        assert!(store.find_user_by_email_or_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryCredentialStore::new();
        store.set_unavailable(true);

        assert!(store.health_check().await.is_err());
        assert!(store.exists_by_email("a@x.com").await.is_err());

        store.set_unavailable(false);
        assert!(store.health_check().await.is_ok());
    }
}
