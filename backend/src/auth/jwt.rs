//! JWT token issuing and verification
//!
//! Provides access and refresh token management with pre-computed keys.
//! The signing secret is read once at startup; keys are never rotated
//! while the process runs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use task_app_shared::TokenError;
use tracing::debug;

/// Kind of token carried in the claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer (user ID the token was minted for)
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type: "access" or "refresh"
    pub token_type: TokenKind,
}

impl Claims {
    /// A token stops being valid at its `exp` second.
    #[inline]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// An encoded token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Pre-computed JWT keys for efficient token operations
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Token lifetimes
#[derive(Debug, Clone, Copy)]
pub struct TokenConfig {
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
}

/// Token issuer
///
/// Minting and verification are separate so callers can apply their own
/// expiry and persistence policy per token kind. Keys are wrapped in Arc,
/// so cloning is cheap.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    config: TokenConfig,
    validation: Arc<Validation>,
}

impl TokenService {
    /// Create a new token service with pre-computed keys
    ///
    /// Call this once at application startup and store it in AppState.
    pub fn new(secret: &str, access_token_expiry_secs: i64, refresh_token_expiry_secs: i64) -> Self {
        // Expiry is checked by callers, not by the decoder.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            keys: JwtKeys::new(secret),
            config: TokenConfig {
                access_token_expiry_secs,
                refresh_token_expiry_secs,
            },
            validation: Arc::new(validation),
        }
    }

    /// Issue an access token for a subject
    #[inline]
    pub fn issue_access_token(&self, subject: &str) -> Result<IssuedToken> {
        self.issue_at(TokenKind::Access, subject, Utc::now())
    }

    /// Issue a refresh token for a subject
    #[inline]
    pub fn issue_refresh_token(&self, subject: &str) -> Result<IssuedToken> {
        self.issue_at(TokenKind::Refresh, subject, Utc::now())
    }

    /// Issue a token of the given kind as if minted at `now`
    pub fn issue_at(&self, kind: TokenKind, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken> {
        let ttl = match kind {
            TokenKind::Access => self.config.access_token_expiry_secs,
            TokenKind::Refresh => self.config.refresh_token_expiry_secs,
        };
        let iat = now.timestamp();

        let claims = Claims {
            sub: subject.to_string(),
            iss: subject.to_string(),
            iat,
            exp: iat + ttl,
            token_type: kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, self.keys.encoding())
            .map_err(|e| anyhow::anyhow!("Failed to generate {} token: {}", kind.as_str(), e))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token's signature and structure and return its claims
    ///
    /// Expiry is not checked here.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, self.keys.decoding(), &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token failed verification");
                TokenError::Malformed
            })
    }

    /// Validate an access token: signature, token type and expiry
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenKind::Access {
            return Err(TokenError::Malformed);
        }
        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn create_test_service() -> TokenService {
        TokenService::new("test-secret", 900, 604800)
    }

    #[test]
    fn test_access_token_claims_round_trip() {
        let service = create_test_service();

        let issued = service.issue_access_token("42").unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, "42");
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_claims_round_trip() {
        let service = create_test_service();

        let issued = service.issue_refresh_token("7").unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.token_type, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn test_verify_does_not_check_expiry() {
        let service = create_test_service();
        let long_ago = Utc::now() - Duration::days(30);

        let issued = service.issue_at(TokenKind::Refresh, "1", long_ago).unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert!(claims.is_expired_at(Utc::now().timestamp()));
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let service = create_test_service();
        let long_ago = Utc::now() - Duration::hours(2);

        let issued = service.issue_at(TokenKind::Access, "1", long_ago).unwrap();

        assert_eq!(
            service.validate_access_token(&issued.token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = create_test_service();

        let issued = service.issue_refresh_token("1").unwrap();

        assert_eq!(
            service.validate_access_token(&issued.token),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let service = create_test_service();

        assert_eq!(service.verify("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let service = create_test_service();
        let other = TokenService::new("other-secret", 900, 604800);

        let issued = other.issue_access_token("1").unwrap();

        assert_eq!(service.verify(&issued.token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = Claims {
            sub: "1".to_string(),
            iss: "1".to_string(),
            iat: 100,
            exp: 200,
            token_type: TokenKind::Access,
        };

        assert!(!claims.is_expired_at(199));
        assert!(claims.is_expired_at(200));
        assert!(claims.is_expired_at(201));
    }

    #[test]
    fn test_service_clones_share_keys() {
        let service = create_test_service();
        let cloned = service.clone();

        let issued = service.issue_access_token("5").unwrap();
        assert!(cloned.validate_access_token(&issued.token).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Claims survive encode/verify bit-exact for any subject and issue time
        #[test]
        fn prop_claims_survive_signing(
            user_id in 1i64..i64::MAX / 2,
            offset_secs in 0i64..(10 * 365 * 24 * 3600),
            refresh in any::<bool>(),
        ) {
            let service = create_test_service();
            let kind = if refresh { TokenKind::Refresh } else { TokenKind::Access };
            let now = Utc::now() - Duration::seconds(offset_secs);

            let issued = service.issue_at(kind, &user_id.to_string(), now).unwrap();
            let claims = service.verify(&issued.token).unwrap();

            prop_assert_eq!(claims, issued.claims);
        }
    }
}
