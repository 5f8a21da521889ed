use axum::Json;
use axum::extract::State;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::LeaveType;
use crate::state::SharedState;

pub async fn list(_auth: AuthUser, State(state): State<SharedState>) -> Result<Json<Vec<LeaveType>>, AppError> {
    Ok(Json(db::leave_types::list(&state.pool).await?))
}
