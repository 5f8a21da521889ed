use axum::Json;
use axum::extract::State;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::LeaveStats;
use crate::state::SharedState;

pub async fn stats(auth: AuthUser, State(state): State<SharedState>) -> Result<Json<LeaveStats>, AppError> {
    Ok(Json(state.workflow.stats(&auth.actor()).await?))
}
