//! Error types for the Task App

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-field error messages for signup input
///
/// Only the fields that failed carry a message; the rest are omitted
/// when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl FieldErrors {
    /// True when no field has been flagged
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.password.is_none()
    }

    /// Convert into a `Result`, failing when any field is flagged
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Token error types
///
/// These never reach the client verbatim; they are flattened into a
/// uniform 401/403 response at the HTTP boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Missing token")]
    Missing,

    #[error("Malformed token")]
    Malformed,

    #[error("Token expired")]
    Expired,

    #[error("Token revoked or unknown")]
    RevokedOrUnknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_field_errors() {
        let errors = FieldErrors::default();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_flagged_field_errors_serialize_only_set_fields() {
        let errors = FieldErrors {
            email: Some("Email is already registered".to_string()),
            ..Default::default()
        };
        assert!(!errors.is_empty());

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"], "Email is already registered");
        assert!(json.get("username").is_none());
        assert!(json.get("password").is_none());
    }
}
