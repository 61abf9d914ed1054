//! Business logic services
//!
//! Services encapsulate business logic and coordinate between the
//! credential store and the token issuer.

pub mod session;
pub mod user;

pub use session::{SessionService, SessionTokens};
pub use user::UserService;
