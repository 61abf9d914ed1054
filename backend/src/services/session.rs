//! Session service: signup, login, access-token refresh and logout
//!
//! A session moves from anonymous to authenticated on signup or login,
//! gets renewed through the refresh token, and ends on logout or when the
//! refresh token is rejected.
//!
//! # Performance
//!
//! - Password hashing/verification runs on the blocking thread pool
//! - Tokens are signed with pre-computed keys

use crate::auth::{IssuedToken, PasswordService, TokenKind, TokenService};
use crate::error::ApiError;
use crate::repositories::{CredentialStore, NewUser};
use chrono::Utc;
use secrecy::ExposeSecret;
use std::sync::Arc;
use task_app_shared::validation::{normalize_identity, validate_signup};
use task_app_shared::{AuthTokens, FieldErrors, LoginRequest, SignupRequest, TokenError};
use tracing::{debug, info, warn};

/// Access and refresh tokens of a freshly opened session
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

impl SessionTokens {
    /// Response body carrying both tokens
    pub fn to_auth_tokens(&self) -> AuthTokens {
        AuthTokens {
            access_token: self.access.token.clone(),
            refresh_token: self.refresh.token.clone(),
        }
    }
}

/// Session service
///
/// Holds the credential store and token issuer it was constructed with;
/// cloning is cheap.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
}

impl SessionService {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Register a new user and open a session
    ///
    /// Every field is validated, and both uniqueness checks run, before
    /// anything is reported, so one response lists all problems.
    pub async fn signup(&self, req: SignupRequest) -> Result<SessionTokens, ApiError> {
        let email = normalize_identity(&req.email);
        let username = normalize_identity(&req.username);

        validate_signup(&email, &username, req.password.expose_secret())
            .map_err(ApiError::Validation)?;

        let (email_taken, username_taken) = tokio::try_join!(
            self.store.exists_by_email(&email),
            self.store.exists_by_username(&username),
        )?;

        let mut conflicts = FieldErrors::default();
        if email_taken {
            conflicts.email = Some("Email is already registered".to_string());
        }
        if username_taken {
            conflicts.username = Some("Username is already registered".to_string());
        }
        if !conflicts.is_empty() {
            debug!(email_taken, username_taken, "Signup rejected: identity in use");
            return Err(ApiError::Conflict(conflicts));
        }

        let password_hash = PasswordService::hash_async(req.password)
            .await
            .map_err(ApiError::Internal)?;

        let mint_refresh = |user_id: i64| self.tokens.issue_refresh_token(&user_id.to_string());
        let (user, refresh) = self
            .store
            .create_user_with_refresh_claim(
                NewUser {
                    email,
                    username,
                    password_hash,
                },
                &mint_refresh,
            )
            .await?;

        let access = self
            .tokens
            .issue_access_token(&user.id.to_string())
            .map_err(ApiError::Internal)?;

        info!(user_id = user.id, "User signed up");

        Ok(SessionTokens { access, refresh })
    }

    /// Log in with an email or username and a password
    ///
    /// Unknown identities and wrong passwords produce the same error, and
    /// both paths run one password verification.
    pub async fn login(&self, req: LoginRequest) -> Result<SessionTokens, ApiError> {
        let identity = normalize_identity(&req.identity);

        let Some(user) = self.store.find_user_by_email_or_username(&identity).await? else {
            PasswordService::verify_dummy_async(req.password)
                .await
                .map_err(ApiError::Internal)?;
            debug!("Login failed: unknown identity");
            return Err(ApiError::InvalidCredentials);
        };

        let valid = PasswordService::verify_async(req.password, user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;

        if !valid {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let tokens = self.open_session(user.id).await?;
        info!(user_id = user.id, "User logged in");

        Ok(tokens)
    }

    /// Mint a new access token from a presented refresh token
    ///
    /// The refresh token must verify, be a refresh token, match a persisted
    /// claim record exactly, and be unexpired. It is not rotated.
    pub async fn refresh_access_token(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<IssuedToken, ApiError> {
        let token = refresh_token.ok_or(ApiError::Forbidden(TokenError::Missing))?;

        let claims = self.tokens.verify(token).map_err(reject_refresh)?;
        if claims.token_type != TokenKind::Refresh {
            return Err(reject_refresh(TokenError::Malformed));
        }

        let record = self
            .store
            .find_refresh_claim(&claims.iss, claims.iat, claims.exp)
            .await?;
        if record.is_none() {
            return Err(reject_refresh(TokenError::RevokedOrUnknown));
        }

        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(reject_refresh(TokenError::Expired));
        }

        let access = self
            .tokens
            .issue_access_token(&claims.iss)
            .map_err(ApiError::Internal)?;

        debug!(issuer = %claims.iss, "Access token renewed");

        Ok(access)
    }

    /// End a session by deleting its refresh claim record
    ///
    /// Idempotent: an absent or unverifiable token is not an error.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), ApiError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        match self.tokens.verify(token) {
            Ok(claims) if claims.token_type == TokenKind::Refresh => {
                let removed = self
                    .store
                    .delete_refresh_claim(&claims.iss, claims.iat, claims.exp)
                    .await?;
                info!(issuer = %claims.iss, removed, "User logged out");
            }
            _ => debug!("Logout with unusable refresh token"),
        }

        Ok(())
    }

    /// Issue both tokens and persist the refresh claim
    async fn open_session(&self, user_id: i64) -> Result<SessionTokens, ApiError> {
        let subject = user_id.to_string();
        let access = self
            .tokens
            .issue_access_token(&subject)
            .map_err(ApiError::Internal)?;
        let refresh = self
            .tokens
            .issue_refresh_token(&subject)
            .map_err(ApiError::Internal)?;

        self.store.create_refresh_claim(&refresh.claims).await?;

        Ok(SessionTokens { access, refresh })
    }
}

fn reject_refresh(reason: TokenError) -> ApiError {
    debug!(%reason, "Refresh token rejected");
    ApiError::Forbidden(reason)
}
