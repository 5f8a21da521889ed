use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt::{self, Claims};
use crate::db;
use crate::error::AppError;
use crate::models::RoleSet;
use crate::state::SharedState;
use crate::workflow::Actor;

pub const ACCESS_COOKIE: &str = "access_token";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: RoleSet,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.roles.clone())
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.roles.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Roles are read from the user row on every request, so a role change
    /// takes effect before the token expires.
    async fn load(state: &SharedState, claims: Claims) -> Result<Self, AppError> {
        let Some(user) = db::users::find_by_id(&state.pool, claims.sub).await? else {
            tracing::debug!(user_id = %claims.sub, "Token for unknown user");
            return Err(AppError::Unauthorized("Account no longer exists".to_string()));
        };
        Ok(Self {
            user_id: user.id,
            roles: user.role_set(),
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = jwt::decode_token(token, &state.config.jwt_secret)
                    .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
                return AuthUser::load(state, claims).await;
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(ACCESS_COOKIE) {
            let claims = jwt::decode_token(cookie.value(), &state.config.jwt_secret)
                .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
            return AuthUser::load(state, claims).await;
        }

        Err(AppError::Unauthorized(
            "Missing authentication token".to_string(),
        ))
    }
}
