//! Refresh claim repository
//!
//! A refresh token is only honoured while a row with its exact
//! (issuer, issued_at, expires_at) triple exists.

use crate::auth::Claims;
use sqlx::postgres::PgExecutor;

/// Persisted mirror of an issued refresh token's claims
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshClaimRecord {
    pub id: i64,
    pub issuer: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl RefreshClaimRecord {
    /// True when the record mirrors exactly these claims
    pub fn matches(&self, issuer: &str, issued_at: i64, expires_at: i64) -> bool {
        self.issuer == issuer && self.issued_at == issued_at && self.expires_at == expires_at
    }
}

/// Refresh claim repository for database operations
pub struct RefreshClaimRepository;

impl RefreshClaimRepository {
    /// Persist the claims of a refresh token
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        claims: &Claims,
    ) -> Result<RefreshClaimRecord, sqlx::Error> {
        sqlx::query_as::<_, RefreshClaimRecord>(
            r#"
            INSERT INTO refresh_claims (issuer, issued_at, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, issuer, issued_at, expires_at
            "#,
        )
        .bind(&claims.iss)
        .bind(claims.iat)
        .bind(claims.exp)
        .fetch_one(executor)
        .await
    }

    /// Find the record matching the exact claim triple
    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> Result<Option<RefreshClaimRecord>, sqlx::Error> {
        sqlx::query_as::<_, RefreshClaimRecord>(
            r#"
            SELECT id, issuer, issued_at, expires_at
            FROM refresh_claims
            WHERE issuer = $1 AND issued_at = $2 AND expires_at = $3
            LIMIT 1
            "#,
        )
        .bind(issuer)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_optional(executor)
        .await
    }

    /// Delete records matching the exact claim triple
    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        issuer: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_claims
            WHERE issuer = $1 AND issued_at = $2 AND expires_at = $3
            "#,
        )
        .bind(issuer)
        .bind(issued_at)
        .bind(expires_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
