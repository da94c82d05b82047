use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::{ApiError, ApiResult},
    model::role::Role,
    models::{CredentialsSql, LoginReqDto, LoginResponse},
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    // 1️⃣ Basic validation
    let email = user.email.trim().to_lowercase();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::bad_request("Email and password are required"));
    }

    // 2️⃣ Fetch user
    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, CredentialsSql>(
        r#"
        SELECT id, email, password, role, is_active
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    let db_user = match db_user {
        Some(u) if u.is_active => u,
        Some(u) => {
            info!(user_id = u.id, "Invalid credentials: user is deactivated");
            return Err(ApiError::InvalidCredentials);
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::InvalidCredentials);
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    let role = Role::from_db(&db_user.role).ok_or_else(|| {
        error!(user_id = db_user.id, role = %db_user.role, "Stored role is not recognised");
        ApiError::internal("Unknown role")
    })?;

    // 4️⃣ Generate access token
    debug!(user_id = db_user.id, "Generating access token");

    let access_token = generate_access_token(
        db_user.id,
        db_user.email,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    }))
}
