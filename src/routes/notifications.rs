use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::Notification;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(
        state
            .workflow
            .notifications(&auth.actor(), params.unread_only)
            .await?,
    ))
}

pub async fn unread_count(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<UnreadCount>, AppError> {
    let unread = state.workflow.unread_count(&auth.actor()).await?;
    Ok(Json(UnreadCount { unread }))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<MarkedRead>, AppError> {
    state.workflow.mark_read(&auth.actor(), id).await?;
    Ok(Json(MarkedRead { updated: 1 }))
}

pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<MarkedRead>, AppError> {
    let updated = state.workflow.mark_all_read(&auth.actor()).await?;
    Ok(Json(MarkedRead { updated }))
}
