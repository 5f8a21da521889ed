//! Collaborator interfaces the workflow engine is constructed with.
//!
//! Every dependency is handed in explicitly through [`WorkflowDeps`]; the
//! engine never looks services up on its own.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{
    AuditAction, AuditLogEntry, LeaveRequest, LeaveRequestWithOwner, LeaveStats, LeaveStatus,
    LeaveType, Notification, Role, User,
};
use crate::realtime::LiveEvent;

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {err}"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            StoreError::Unavailable(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub owner_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type_id: Option<i64>,
}

/// Editable fields of a pending request, already merged and validated.
#[derive(Debug, Clone)]
pub struct LeaveFields {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type_id: Option<i64>,
}

/// Audit entry written in the same store transaction as the change it describes.
/// The store fills in the leave-request reference.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub actor_id: Uuid,
    pub details: String,
}

impl AuditRecord {
    pub fn new(action: AuditAction, actor_id: Uuid, details: impl Into<String>) -> Self {
        Self {
            action,
            actor_id,
            details: details.into(),
        }
    }
}

/// Standalone audit entry. A reference to a request that no longer exists is
/// stored as null instead of failing the append.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub actor_id: Uuid,
    pub leave_request_id: Option<i64>,
    pub details: String,
}

/// Result of a write that only applies to a pending request.
#[derive(Debug, Clone)]
pub enum Guarded {
    Applied(LeaveRequest),
    /// No request with that id (possibly deleted concurrently).
    Missing,
    /// The request exists but the guard did not hold; carries its current state.
    Blocked(LeaveRequest),
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    /// Restrict to one owner; `None` lists every request.
    pub owner_id: Option<Uuid>,
    /// Case-insensitive match on status or owner first/last name.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub date_from: Option<NaiveDate>,
    /// Inclusive: entries up to the end of this day match.
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive match on action or actor display name.
    pub search: Option<String>,
    pub leave_request_id: Option<i64>,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Persist a new pending request together with its `Create` audit entry.
    async fn insert(
        &self,
        request: &NewLeaveRequest,
        audit: &AuditRecord,
    ) -> Result<LeaveRequest, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<LeaveRequest>, StoreError>;

    /// Move a pending request to `to`, appending `audit` on success.
    async fn transition(
        &self,
        id: i64,
        to: LeaveStatus,
        audit: &AuditRecord,
    ) -> Result<Guarded, StoreError>;

    /// Overwrite the fields of a pending request, appending `audit` on success.
    /// When `expected_version` is set the write only applies at that version.
    async fn update_fields(
        &self,
        id: i64,
        fields: &LeaveFields,
        expected_version: Option<i32>,
        audit: &AuditRecord,
    ) -> Result<Guarded, StoreError>;

    /// Remove a request after recording `audit` against it. Returns false when
    /// the request was already gone.
    async fn delete(&self, id: i64, audit: &AuditRecord) -> Result<bool, StoreError>;

    /// Newest submission first.
    async fn list(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequestWithOwner>, StoreError>;

    async fn count(&self, query: &LeaveQuery) -> Result<i64, StoreError>;

    async fn stats(&self) -> Result<LeaveStats, StoreError>;

    async fn leave_type(&self, id: i64) -> Result<Option<LeaveType>, StoreError>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: &NewAuditEntry) -> Result<(), StoreError>;

    /// Filters are conjunctive; newest entry first.
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, user_id: Uuid, message: &str) -> Result<Notification, StoreError>;

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, StoreError>;

    /// Returns false when no such notification belongs to `user_id`.
    async fn mark_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

/// Identity provider.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Users holding at least one of `roles`, each listed once.
    async fn users_in_roles(&self, roles: &[Role]) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String>;
}

/// Live push to connected clients. At most once, no replay.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, event: LiveEvent);
}
