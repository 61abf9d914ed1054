//! Authentication module
//!
//! Provides JWT-based session tokens delivered as HTTP-only cookies, with
//! argon2 password hashing.

pub mod cookies;
mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, IssuedToken, TokenKind, TokenService};
pub use middleware::{authenticate, require_auth, AuthUser};
pub use password::PasswordService;
