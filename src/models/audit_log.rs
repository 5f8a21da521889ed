use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Edit,
    Delete,
    Approve,
    Reject,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Edit => "Edit",
            AuditAction::Delete => "Delete",
            AuditAction::Approve => "Approve",
            AuditAction::Reject => "Reject",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(AuditAction::Create),
            "Edit" => Ok(AuditAction::Edit),
            "Delete" => Ok(AuditAction::Delete),
            "Approve" => Ok(AuditAction::Approve),
            "Reject" => Ok(AuditAction::Reject),
            other => Err(format!("Unknown audit action: {other}")),
        }
    }
}

text_column!(AuditAction);

/// One append-only history row.
///
/// `leave_request_id` is cleared once the request is deleted; `subject_id`
/// keeps the id the entry was written against.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: AuditAction,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub leave_request_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
