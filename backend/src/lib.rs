//! Task App Backend Library
//!
//! Account signup, login and cookie-carried JWT sessions. The modules are
//! exposed for the integration tests and the server binary.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
