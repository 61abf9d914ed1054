//! Auth cookie construction
//!
//! Both tokens travel as HTTP-only cookies whose expiry matches the token's
//! own `exp` claim.

use super::jwt::IssuedToken;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build()
}

fn token_cookie(name: &'static str, issued: &IssuedToken, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(name, issued.token.clone(), secure);
    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(issued.claims.exp) {
        cookie.set_expires(expires);
    }
    cookie
}

/// Build the `access_token` cookie
pub fn access_cookie(issued: &IssuedToken, secure: bool) -> Cookie<'static> {
    token_cookie(ACCESS_TOKEN_COOKIE, issued, secure)
}

/// Build the `refresh_token` cookie
pub fn refresh_cookie(issued: &IssuedToken, secure: bool) -> Cookie<'static> {
    token_cookie(REFRESH_TOKEN_COOKIE, issued, secure)
}

/// Cookie instructing the client to drop `name`
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Add both session cookies to the jar
pub fn with_session_cookies(
    jar: CookieJar,
    access: &IssuedToken,
    refresh: &IssuedToken,
    secure: bool,
) -> CookieJar {
    jar.add(access_cookie(access, secure))
        .add(refresh_cookie(refresh, secure))
}

/// Replace both session cookies with removal cookies
///
/// Removal cookies are always emitted, even when the request did not carry
/// the cookie.
pub fn clear_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE, secure))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE, secure))
}

/// Read a cookie value from the jar
pub fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}
