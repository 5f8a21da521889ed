use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::{Role, RoleSet, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateRolesRequest {
    pub roles: Vec<String>,
}

/// Every name must be a known role; an empty list means plain `User`.
fn parse_roles(names: &[String]) -> Result<RoleSet, AppError> {
    let mut roles = RoleSet::new();
    for name in names {
        let role: Role = name
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Unknown role: {name}")))?;
        roles.insert(role);
    }
    if roles.is_empty() {
        roles.insert(Role::User);
    }
    Ok(roles)
}

pub async fn list(auth: AuthUser, State(state): State<SharedState>) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    Ok(Json(db::users::list_all(&state.pool).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    if req.email.trim().is_empty() || req.first_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Email and first name are required".to_string(),
        ));
    }
    if req.password.len() < password::MIN_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            password::MIN_LENGTH
        )));
    }
    let roles = parse_roles(&req.roles)?;

    if db::users::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let user = db::users::create(
        &state.pool,
        req.email.trim(),
        &pw_hash,
        req.first_name.trim(),
        req.last_name.trim(),
        &roles.names(),
    )
    .await?;

    tracing::info!(user_id = %user.id, created_by = %auth.user_id, "User created");
    Ok(Json(user))
}

pub async fn update_roles(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRolesRequest>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;
    let roles = parse_roles(&req.roles)?;

    let user = db::users::update_roles(&state.pool, id, &roles.names())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %id, roles = ?user.roles, "Roles updated");
    Ok(Json(user))
}
