//! PostgreSQL credential store

use super::{
    CredentialStore, NewUser, RefreshClaimRecord, RefreshClaimRepository, RefreshMinter,
    StoreResult, UserRecord, UserRepository,
};
use crate::auth::{Claims, IssuedToken};
use crate::db;
use async_trait::async_trait;
use sqlx::PgPool;

/// Credential store backed by a PostgreSQL pool
///
/// PgPool is internally Arc'd, so cloning is cheap.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email_or_username(
        &self,
        identity: &str,
    ) -> StoreResult<Option<UserRecord>> {
        Ok(UserRepository::find_by_email_or_username(&self.pool, identity).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        Ok(UserRepository::find_by_id(&self.pool, id).await?)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(UserRepository::email_exists(&self.pool, email).await?)
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(UserRepository::username_exists(&self.pool, username).await?)
    }

    async fn create_user_with_refresh_claim(
        &self,
        user: NewUser,
        mint_refresh: RefreshMinter<'_>,
    ) -> StoreResult<(UserRecord, IssuedToken)> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let record = UserRepository::create(&mut *tx, &user).await?;
        let refresh = mint_refresh(record.id)?;
        RefreshClaimRepository::create(&mut *tx, &refresh.claims).await?;

        tx.commit().await?;

        Ok((record, refresh))
    }

    async fn create_refresh_claim(&self, claims: &Claims) -> StoreResult<RefreshClaimRecord> {
        Ok(RefreshClaimRepository::create(&self.pool, claims).await?)
    }

    async fn find_refresh_claim(
        &self,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> StoreResult<Option<RefreshClaimRecord>> {
        Ok(RefreshClaimRepository::find(&self.pool, issuer, issued_at, expires_at).await?)
    }

    async fn delete_refresh_claim(
        &self,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> StoreResult<u64> {
        Ok(RefreshClaimRepository::delete(&self.pool, issuer, issued_at, expires_at).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(db::health_check(&self.pool).await?)
    }
}
