//! User repository for database operations

use chrono::{DateTime, Utc};
use sqlx::postgres::PgExecutor;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// User repository for database operations
///
/// Functions take any Postgres executor so they run against the pool or
/// inside a transaction.
pub struct UserRepository;

impl UserRepository {
    /// Insert a new user
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        user: &NewUser,
    ) -> Result<UserRecord, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(executor)
        .await
    }

    /// Find user by email or username
    pub async fn find_by_email_or_username<'e>(
        executor: impl PgExecutor<'e>,
        identity: &str,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE email = $1 OR username = $1
            LIMIT 1
            "#,
        )
        .bind(identity)
        .fetch_optional(executor)
        .await
    }

    /// Find user by ID
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: i64,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Check if email exists
    pub async fn email_exists<'e>(
        executor: impl PgExecutor<'e>,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(executor)
        .await
    }

    /// Check if username exists
    pub async fn username_exists<'e>(
        executor: impl PgExecutor<'e>,
        username: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)
            "#,
        )
        .bind(username)
        .fetch_one(executor)
        .await
    }
}
