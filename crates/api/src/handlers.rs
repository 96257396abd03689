/// Event lifecycle, registration and check-in handlers
pub mod events;
/// Notification inbox handlers
pub mod notifications;
/// Live session handlers
pub mod sessions;

use learnhub_core::{
    errors::LearnError,
    models::user::{User, UserRole},
};

use crate::ApiState;
use crate::middleware::error_handling::AppError;

/// Resolves the acting user's stored row; the id alone proves nothing about
/// the role.
pub(crate) async fn load_caller(state: &ApiState, user_id: i64) -> Result<User, AppError> {
    let user = learnhub_db::repositories::user::get_user_by_id(&state.db_pool, user_id)
        .await
        .map_err(LearnError::Database)?
        .ok_or_else(|| LearnError::NotFound(format!("User with ID {} not found", user_id)))?
        .into_model()
        .map_err(LearnError::Database)?;
    Ok(user)
}

pub(crate) fn require_role(user: &User, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError(LearnError::Forbidden(format!(
            "Requires {} role",
            role.as_str()
        ))));
    }
    Ok(())
}
