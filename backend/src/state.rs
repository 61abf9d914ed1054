//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys and the store are created once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::repositories::CredentialStore;
use crate::services::SessionService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Credential store (PostgreSQL in production)
    pub store: Arc<dyn CredentialStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Token issuer with cached keys
    pub jwt: TokenService,
    /// Session manager sharing the store and token issuer
    pub sessions: SessionService,
}

impl AppState {
    /// Create a new application state
    ///
    /// Derives the signing keys from the configured secret, so call this
    /// once at application startup.
    pub fn new(store: Arc<dyn CredentialStore>, config: AppConfig) -> Self {
        let jwt = TokenService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
        );
        let sessions = SessionService::new(store.clone(), jwt.clone());

        Self {
            store,
            config: Arc::new(config),
            jwt,
            sessions,
        }
    }

    /// Get a reference to the credential store
    #[inline]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Get a reference to the token issuer
    #[inline]
    pub fn jwt(&self) -> &TokenService {
        &self.jwt
    }

    /// Get a reference to the session manager
    #[inline]
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Whether auth cookies carry the `Secure` attribute
    #[inline]
    pub fn secure_cookies(&self) -> bool {
        self.config.cookies.secure
    }
}
