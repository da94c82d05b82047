use crate::config::Config;
use crate::{auth::jwt::verify_token, error::ApiError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized)),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::internal("Config missing"))),
        };

        ready(
            verify_token(token, &config.jwt_secret)
                .map(AuthUser::from)
                .map_err(|_| ApiError::Unauthorized),
        )
    }
}

impl From<crate::models::Claims> for AuthUser {
    fn from(claims: crate::models::Claims) -> Self {
        AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> Result<(), ApiError> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Manager/Admin only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "someone@company.com".into(),
            role,
        }
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Manager).require_admin().is_err());

        assert!(user(Role::Admin).require_manager_or_admin().is_ok());
        assert!(user(Role::Manager).require_manager_or_admin().is_ok());
        assert!(user(Role::Employee).require_manager_or_admin().is_err());
    }
}
