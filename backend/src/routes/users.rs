//! User routes
//!
//! Signup, login, access-token refresh, logout, and the private user
//! data endpoint. Tokens are returned in the body and as HTTP-only cookies.

use crate::auth::{cookies, require_auth, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::CookieJar;
use task_app_shared::{AccessTokenResponse, AuthTokens, LoginRequest, SignupRequest, UserProfile};

/// Create user routes
///
/// Everything under `/private` goes through the auth middleware.
pub fn user_routes(state: AppState) -> Router<AppState> {
    let private = Router::new()
        .route("/user", get(get_user_data))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/token", get(refresh_access_token))
        .route("/logout", post(logout))
        .nest("/private", private)
}

/// Register a new user
///
/// POST /api/v1/users/signup
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<AuthTokens>)> {
    let Json(req) = payload?;

    let session = state.sessions().signup(req).await?;
    let jar = cookies::with_session_cookies(
        jar,
        &session.access,
        &session.refresh,
        state.secure_cookies(),
    );

    Ok((jar, Json(session.to_auth_tokens())))
}

/// Login with email or username and password
///
/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<AuthTokens>)> {
    let Json(req) = payload?;

    let session = state.sessions().login(req).await?;
    let jar = cookies::with_session_cookies(
        jar,
        &session.access,
        &session.refresh,
        state.secure_cookies(),
    );

    Ok((jar, Json(session.to_auth_tokens())))
}

/// Mint a new access token from the `refresh_token` cookie
///
/// GET /api/v1/users/token
///
/// Any rejection clears both cookies. The refresh cookie is left untouched
/// on success.
async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AccessTokenResponse>), (CookieJar, ApiError)> {
    let presented = cookies::cookie_value(&jar, cookies::REFRESH_TOKEN_COOKIE);

    match state
        .sessions()
        .refresh_access_token(presented.as_deref())
        .await
    {
        Ok(access) => {
            let jar = jar.add(cookies::access_cookie(&access, state.secure_cookies()));
            Ok((
                jar,
                Json(AccessTokenResponse {
                    access_token: access.token,
                }),
            ))
        }
        Err(err @ ApiError::Forbidden(_)) => Err((
            cookies::clear_session_cookies(jar, state.secure_cookies()),
            err,
        )),
        Err(err) => Err((jar, err)),
    }
}

/// Revoke the presented refresh token and clear both cookies
///
/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    let presented = cookies::cookie_value(&jar, cookies::REFRESH_TOKEN_COOKIE);

    state.sessions().logout(presented.as_deref()).await?;

    Ok((
        cookies::clear_session_cookies(jar, state.secure_cookies()),
        StatusCode::NO_CONTENT,
    ))
}

/// Get the signed-in user's data
///
/// GET /api/v1/users/private/user
///
/// # Authentication
/// Requires a valid `access_token` cookie.
async fn get_user_data(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let profile = UserService::get_user_data(state.store(), auth_user.user_id).await?;
    Ok(Json(profile))
}
