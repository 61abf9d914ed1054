//! User data access for authenticated callers

use crate::error::ApiError;
use crate::repositories::CredentialStore;
use task_app_shared::UserProfile;
use tracing::warn;

/// User service for the private data endpoint
pub struct UserService;

impl UserService {
    /// Get the data of the user the access token was issued to
    ///
    /// A miss here means the token names a user that no longer exists;
    /// it is reported as not found rather than as an auth failure.
    pub async fn get_user_data(
        store: &dyn CredentialStore,
        user_id: i64,
    ) -> Result<UserProfile, ApiError> {
        let user = store.find_user_by_id(user_id).await?.ok_or_else(|| {
            warn!(user_id, "Authenticated user missing from store");
            ApiError::NotFound("Cannot find the User".to_string())
        })?;

        Ok(UserProfile {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
        })
    }
}
