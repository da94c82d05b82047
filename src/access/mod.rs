//! Who may see whose data, based on the `manager_id` reporting tree.

pub mod directory;
pub mod resolver;

pub use directory::{MySqlDirectory, ReportingDirectory};
pub use resolver::{check_user_access, collect_reports};

use crate::{auth::auth::AuthUser, error::ApiError, model::user::UserId};

/// Handler-side guard around [`check_user_access`].
pub async fn ensure_access<D>(
    directory: &D,
    auth: &AuthUser,
    target_user_id: UserId,
) -> Result<(), ApiError>
where
    D: ReportingDirectory + Sync + ?Sized,
{
    if check_user_access(directory, auth.user_id, auth.role, target_user_id).await {
        Ok(())
    } else {
        tracing::info!(
            user_id = auth.user_id,
            email = %auth.email,
            role = %auth.role,
            target_user_id,
            "Access denied"
        );
        Err(ApiError::forbidden("You do not have access to this user"))
    }
}
