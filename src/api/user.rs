use crate::{
    access::{MySqlDirectory, ensure_access},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::user::{User, UserId, UserRow},
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::instrument;

const USER_COLUMNS: &str = "id, email, name, role, manager_id, is_active";

pub(crate) async fn fetch_user(pool: &MySqlPool, user_id: UserId) -> ApiResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from)
        .transpose()
        .map_err(ApiError::internal)
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Caller's profile", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
#[instrument(skip(pool, auth), fields(user_id = auth.user_id))]
pub async fn get_me(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let user = fetch_user(pool.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Get a user the caller has access to
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id", Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Not in the caller's reporting line"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
#[instrument(skip(pool, auth), fields(user_id = auth.user_id))]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    let target_id = path.into_inner();
    ensure_access(&MySqlDirectory::new(pool.get_ref()), &auth, target_id).await?;

    let user = fetch_user(pool.get_ref(), target_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Active direct reports of a user
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/reports",
    params(("user_id", Path, description = "Manager's user ID")),
    responses(
        (status = 200, description = "Direct reports", body = [User]),
        (status = 403, description = "Not in the caller's reporting line")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
#[instrument(skip(pool, auth), fields(user_id = auth.user_id))]
pub async fn list_direct_reports(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    let manager_id = path.into_inner();
    ensure_access(&MySqlDirectory::new(pool.get_ref()), &auth, manager_id).await?;

    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE manager_id = ? AND is_active = TRUE ORDER BY name"
    ))
    .bind(manager_id)
    .fetch_all(pool.get_ref())
    .await?;

    let reports = rows
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::Ok().json(reports))
}
