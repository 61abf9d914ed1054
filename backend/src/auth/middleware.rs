//! Authentication middleware
//!
//! Guards protected routes: the access token is read from the
//! `access_token` cookie and verified with the pre-computed keys in
//! AppState. Handlers behind the guard read [`AuthUser`] from the request
//! extensions.

use super::cookies::{cookie_value, ACCESS_TOKEN_COOKIE};
use super::jwt::TokenService;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use task_app_shared::TokenError;
use tracing::debug;

/// Authenticated user placed in the request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Resolve the caller from a presented access token
pub fn authenticate(jwt: &TokenService, token: Option<&str>) -> Result<AuthUser, TokenError> {
    let token = token.ok_or(TokenError::Missing)?;
    let claims = jwt.validate_access_token(token)?;
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| TokenError::Malformed)?;
    Ok(AuthUser { user_id })
}

/// Middleware rejecting requests without a valid access token
///
/// Apply with `axum::middleware::from_fn_with_state`. On failure the
/// request never reaches the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie_value(&jar, ACCESS_TOKEN_COOKIE);

    let auth_user = authenticate(state.jwt(), token.as_deref()).map_err(|reason| {
        debug!(%reason, path = %request.uri().path(), "Rejected unauthenticated request");
        ApiError::Unauthorized(reason)
    })?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKind;
    use chrono::{Duration, Utc};

    fn service() -> TokenService {
        TokenService::new("test-secret", 900, 604800)
    }

    #[test]
    fn test_authenticate_valid_token() {
        let jwt = service();
        let issued = jwt.issue_access_token("17").unwrap();

        let user = authenticate(&jwt, Some(&issued.token)).unwrap();
        assert_eq!(user, AuthUser { user_id: 17 });
    }

    #[test]
    fn test_authenticate_missing_token() {
        assert_eq!(authenticate(&service(), None), Err(TokenError::Missing));
    }

    #[test]
    fn test_authenticate_expired_token() {
        let jwt = service();
        let issued = jwt
            .issue_at(TokenKind::Access, "17", Utc::now() - Duration::hours(1))
            .unwrap();

        assert_eq!(
            authenticate(&jwt, Some(&issued.token)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_authenticate_non_numeric_subject() {
        let jwt = service();
        let issued = jwt.issue_access_token("not-a-number").unwrap();

        assert_eq!(
            authenticate(&jwt, Some(&issued.token)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let jwt = service();
        let issued = jwt.issue_refresh_token("17").unwrap();

        assert_eq!(
            authenticate(&jwt, Some(&issued.token)),
            Err(TokenError::Malformed)
        );
    }
}
