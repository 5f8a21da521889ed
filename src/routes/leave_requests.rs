use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::export;
use crate::models::{LeaveRequest, LeaveRequestWithOwner};
use crate::routes::auth::MessageResponse;
use crate::state::SharedState;
use crate::workflow::{LeaveChanges, LeaveSubmission, Page};

#[derive(Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<i64>,
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub search: Option<String>,
    pub format: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<LeaveRequestWithOwner>>, AppError> {
    let page = state
        .workflow
        .list_for_user(&auth.actor(), params.search.as_deref(), params.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<LeaveSubmission>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = state.workflow.create_request(&auth.actor(), req).await?;
    Ok(Json(request))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<LeaveRequest>, AppError> {
    Ok(Json(state.workflow.get_request(&auth.actor(), id).await?))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(changes): Json<LeaveChanges>,
) -> Result<Json<LeaveRequest>, AppError> {
    Ok(Json(state.workflow.update(&auth.actor(), id, changes).await?))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.workflow.delete(&auth.actor(), id).await?;
    Ok(MessageResponse::new("Leave request deleted"))
}

pub async fn approve(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<LeaveRequest>, AppError> {
    Ok(Json(state.workflow.approve(&auth.actor(), id).await?))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<LeaveRequest>, AppError> {
    Ok(Json(state.workflow.reject(&auth.actor(), id).await?))
}

pub async fn export(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let rows = state
        .workflow
        .export_for_user(&auth.actor(), params.search.as_deref())
        .await?;

    match params.format.as_deref().unwrap_or("json") {
        "csv" => Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"leave-requests.csv\"",
                ),
            ],
            export::leave_requests_csv(&rows),
        )
            .into_response()),
        _ => Ok(Json(rows).into_response()),
    }
}
