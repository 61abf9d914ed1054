//! Credential store
//!
//! Persistence for user identities and issued refresh-token claims.
//! Services receive the store as an `Arc<dyn CredentialStore>`, so the
//! PostgreSQL implementation can be swapped for the in-memory one in tests.

use crate::auth::{Claims, IssuedToken};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod refresh_claim;
pub mod user;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;
pub use refresh_claim::{RefreshClaimRecord, RefreshClaimRepository};
pub use user::{NewUser, UserRecord, UserRepository};

/// Identity column guarded by a unique constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => f.write_str("email"),
            UniqueField::Username => f.write_str("username"),
        }
    }
}

/// Credential store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} is already registered")]
    Duplicate(UniqueField),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some("users_email_key") => return StoreError::Duplicate(UniqueField::Email),
                    Some("users_username_key") => {
                        return StoreError::Duplicate(UniqueField::Username)
                    }
                    _ => {}
                }
            }
        }
        StoreError::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Mints the refresh token for a user id that only exists once the user row
/// has been inserted
pub type RefreshMinter<'a> = &'a (dyn Fn(i64) -> anyhow::Result<IssuedToken> + Send + Sync);

/// Durable storage for users and refresh claims
///
/// Email and username arguments must already be normalized.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user whose email or username equals `identity`
    async fn find_user_by_email_or_username(&self, identity: &str)
        -> StoreResult<Option<UserRecord>>;

    /// Find a user by primary key
    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>>;

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;

    /// Create a user and persist its first refresh claim as one unit
    ///
    /// Nothing is stored when inserting the user, minting, or persisting the
    /// claim fails.
    async fn create_user_with_refresh_claim(
        &self,
        user: NewUser,
        mint_refresh: RefreshMinter<'_>,
    ) -> StoreResult<(UserRecord, IssuedToken)>;

    /// Persist the claims of a freshly minted refresh token
    async fn create_refresh_claim(&self, claims: &Claims) -> StoreResult<RefreshClaimRecord>;

    /// Find the record exactly matching (issuer, issued_at, expires_at)
    async fn find_refresh_claim(
        &self,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> StoreResult<Option<RefreshClaimRecord>>;

    /// Delete the record exactly matching the triple, returning rows removed
    async fn delete_refresh_claim(
        &self,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> StoreResult<u64>;

    /// Check the store is reachable
    async fn health_check(&self) -> StoreResult<()>;
}
