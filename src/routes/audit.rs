use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::export;
use crate::models::AuditLogEntry;
use crate::state::SharedState;
use crate::workflow::ports::AuditQuery;

#[derive(Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    Ok(Json(state.workflow.audit_trail(&auth.actor(), query).await?))
}

pub async fn export(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let entries = state.workflow.audit_trail(&auth.actor(), query).await?;

    match params.format.as_deref().unwrap_or("json") {
        "csv" => Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"audit-log.csv\"",
                ),
            ],
            export::audit_csv(&entries),
        )
            .into_response()),
        _ => Ok(Json(entries).into_response()),
    }
}
