//! Leave-request lifecycle.
//!
//! A request is created `Pending` and moves once, to `Approved` or `Rejected`.
//! Every state-changing call writes its audit entry in the same store
//! transaction, and only after that commit are notifications, live events and
//! e-mails attempted. Failures on those side channels are logged, never returned.

mod dispatch;
pub mod error;
pub mod ports;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{
    AuditAction, AuditLogEntry, LeaveRequest, LeaveRequestWithOwner, LeaveStats, LeaveStatus,
    Notification, RoleSet,
};

pub use error::WorkflowError;
use ports::{
    AuditLog, AuditQuery, AuditRecord, Broadcaster, Directory, Guarded, LeaveFields, LeaveQuery,
    LeaveStore, Mailer, NewLeaveRequest, NotificationStore,
};

/// The user performing an operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub roles: RoleSet,
}

impl Actor {
    pub fn new(id: Uuid, roles: RoleSet) -> Self {
        Self { id, roles }
    }

    pub fn is_approver(&self) -> bool {
        self.roles.is_approver()
    }

    /// Owners and admins may edit or delete a request.
    fn may_modify(&self, request: &LeaveRequest) -> bool {
        request.owner_id == self.id || self.roles.is_admin()
    }

    fn may_view(&self, request: &LeaveRequest) -> bool {
        request.owner_id == self.id || self.is_approver()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveSubmission {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
    pub leave_type_id: Option<i64>,
}

/// Partial edit. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveChanges {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    /// `Some(None)` (an explicit `null`) clears the leave type.
    #[serde(default, deserialize_with = "present")]
    pub leave_type_id: Option<Option<i64>>,
    pub expected_version: Option<i32>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> LeaveStatus {
        match self {
            Decision::Approve => LeaveStatus::Approved,
            Decision::Reject => LeaveStatus::Rejected,
        }
    }

    fn audit_action(self) -> AuditAction {
        match self {
            Decision::Approve => AuditAction::Approve,
            Decision::Reject => AuditAction::Reject,
        }
    }
}

pub struct WorkflowDeps {
    pub store: Arc<dyn LeaveStore>,
    pub audit: Arc<dyn AuditLog>,
    pub notifications: Arc<dyn NotificationStore>,
    pub directory: Arc<dyn Directory>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub page_size: i64,
    pub base_url: String,
    pub email_timeout: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            page_size: 5,
            base_url: "http://localhost:3000".to_string(),
            email_timeout: Duration::from_secs(10),
        }
    }
}

pub struct LeaveWorkflow {
    store: Arc<dyn LeaveStore>,
    audit: Arc<dyn AuditLog>,
    notifications: Arc<dyn NotificationStore>,
    directory: Arc<dyn Directory>,
    broadcaster: Arc<dyn Broadcaster>,
    mailer: Option<Arc<dyn Mailer>>,
    settings: WorkflowSettings,
}

impl LeaveWorkflow {
    pub fn new(deps: WorkflowDeps, settings: WorkflowSettings) -> Self {
        Self {
            store: deps.store,
            audit: deps.audit,
            notifications: deps.notifications,
            directory: deps.directory,
            broadcaster: deps.broadcaster,
            mailer: deps.mailer,
            settings,
        }
    }

    pub fn page_size(&self) -> i64 {
        self.settings.page_size
    }

    /// Submit a new request owned by `actor`.
    pub async fn create_request(
        &self,
        actor: &Actor,
        submission: LeaveSubmission,
    ) -> Result<LeaveRequest, WorkflowError> {
        validate::check_dates(submission.start_date, submission.end_date)?;
        validate::check_reason(&submission.reason)?;
        self.check_leave_type(submission.leave_type_id).await?;

        let new = NewLeaveRequest {
            owner_id: actor.id,
            start_date: submission.start_date,
            end_date: submission.end_date,
            reason: submission.reason,
            leave_type_id: submission.leave_type_id,
        };
        let audit = AuditRecord::new(AuditAction::Create, actor.id, "Created leave request");
        let request = self.store.insert(&new, &audit).await?;

        tracing::info!(
            leave_request_id = request.id,
            actor_id = %actor.id,
            "Leave request submitted"
        );

        self.announce_submission(&request).await;
        Ok(request)
    }

    pub async fn get_request(&self, actor: &Actor, id: i64) -> Result<LeaveRequest, WorkflowError> {
        let request = self.load(id).await?;
        if !actor.may_view(&request) {
            return Err(WorkflowError::Authorization(
                "You can only view your own leave requests".to_string(),
            ));
        }
        Ok(request)
    }

    pub async fn approve(&self, actor: &Actor, id: i64) -> Result<LeaveRequest, WorkflowError> {
        self.decide(actor, id, Decision::Approve).await
    }

    pub async fn reject(&self, actor: &Actor, id: i64) -> Result<LeaveRequest, WorkflowError> {
        self.decide(actor, id, Decision::Reject).await
    }

    /// Terminal requests are never re-decided: a second approve or reject
    /// fails with `InvalidState` and writes nothing.
    async fn decide(
        &self,
        actor: &Actor,
        id: i64,
        decision: Decision,
    ) -> Result<LeaveRequest, WorkflowError> {
        if !actor.is_approver() {
            return Err(WorkflowError::Authorization(
                "Only Admin, Manager or HR can decide leave requests".to_string(),
            ));
        }

        let details = match decision {
            Decision::Approve => "Approved leave request",
            Decision::Reject => "Rejected leave request",
        };
        let audit = AuditRecord::new(decision.audit_action(), actor.id, details);

        let request = match self.store.transition(id, decision.status(), &audit).await? {
            Guarded::Applied(request) => request,
            Guarded::Missing => return Err(WorkflowError::leave_not_found(id)),
            Guarded::Blocked(current) => {
                return Err(WorkflowError::InvalidState(format!(
                    "Leave request {id} is already {}",
                    current.status
                )));
            }
        };

        tracing::info!(
            leave_request_id = id,
            actor_id = %actor.id,
            status = %request.status,
            "Leave request decided"
        );

        self.announce_decision(&request, decision).await;
        Ok(request)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        changes: LeaveChanges,
    ) -> Result<LeaveRequest, WorkflowError> {
        let current = self.load(id).await?;
        if !actor.may_modify(&current) {
            return Err(WorkflowError::Authorization(
                "Only the owner or an Admin can edit this leave request".to_string(),
            ));
        }
        if !current.is_pending() {
            return Err(WorkflowError::InvalidState(format!(
                "Leave request {id} is {} and can no longer be edited",
                current.status
            )));
        }

        let fields = LeaveFields {
            start_date: changes.start_date.unwrap_or(current.start_date),
            end_date: changes.end_date.unwrap_or(current.end_date),
            reason: changes.reason.unwrap_or_else(|| current.reason.clone()),
            leave_type_id: changes.leave_type_id.unwrap_or(current.leave_type_id),
        };
        validate::check_dates(fields.start_date, fields.end_date)?;
        validate::check_reason(&fields.reason)?;
        if fields.leave_type_id != current.leave_type_id {
            self.check_leave_type(fields.leave_type_id).await?;
        }

        let audit = AuditRecord::new(AuditAction::Edit, actor.id, "Updated leave request");
        let outcome = self
            .store
            .update_fields(id, &fields, changes.expected_version, &audit)
            .await?;

        match outcome {
            Guarded::Applied(request) => {
                tracing::info!(leave_request_id = id, actor_id = %actor.id, "Leave request edited");
                Ok(request)
            }
            Guarded::Missing => Err(WorkflowError::leave_not_found(id)),
            Guarded::Blocked(latest) if !latest.is_pending() => Err(WorkflowError::InvalidState(
                format!("Leave request {id} is {} and can no longer be edited", latest.status),
            )),
            Guarded::Blocked(latest) => Err(WorkflowError::Conflict(format!(
                "Leave request {id} was modified (now at version {})",
                latest.version
            ))),
        }
    }

    /// Remove a request. Its audit history stays, with the reference cleared.
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<(), WorkflowError> {
        let current = self.load(id).await?;
        if !actor.may_modify(&current) {
            return Err(WorkflowError::Authorization(
                "Only the owner or an Admin can delete this leave request".to_string(),
            ));
        }

        let audit = AuditRecord::new(AuditAction::Delete, actor.id, "Deleted leave request");
        if !self.store.delete(id, &audit).await? {
            return Err(WorkflowError::leave_not_found(id));
        }

        tracing::info!(leave_request_id = id, actor_id = %actor.id, "Leave request deleted");
        Ok(())
    }

    /// Approvers see every request, everyone else only their own. Pages start at 1;
    /// a page past the end comes back empty.
    pub async fn list_for_user(
        &self,
        actor: &Actor,
        search: Option<&str>,
        page: i64,
    ) -> Result<Page<LeaveRequestWithOwner>, WorkflowError> {
        let page = page.max(1);
        let page_size = self.settings.page_size.max(1);

        let mut query = self.visible_to(actor, search);
        let total = self.store.count(&query).await?;

        // A page whose offset does not fit in i64 is past the end.
        let items = match (page - 1).checked_mul(page_size) {
            Some(offset) if offset < total => {
                query.limit = Some(page_size);
                query.offset = offset;
                self.store.list(&query).await?
            }
            _ => Vec::new(),
        };

        Ok(Page {
            items,
            page,
            page_size,
            total,
            total_pages: if total == 0 { 0 } else { (total - 1) / page_size + 1 },
        })
    }

    /// Every request `list_for_user` would show, unpaged.
    pub async fn export_for_user(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<LeaveRequestWithOwner>, WorkflowError> {
        let query = self.visible_to(actor, search);
        Ok(self.store.list(&query).await?)
    }

    pub async fn audit_trail(
        &self,
        actor: &Actor,
        mut query: AuditQuery,
    ) -> Result<Vec<AuditLogEntry>, WorkflowError> {
        self.require_approver(actor)?;
        query.search = validate::normalize_search(query.search.as_deref());
        Ok(self.audit.query(&query).await?)
    }

    pub async fn stats(&self, actor: &Actor) -> Result<LeaveStats, WorkflowError> {
        self.require_approver(actor)?;
        Ok(self.store.stats().await?)
    }

    pub async fn notifications(
        &self,
        actor: &Actor,
        unread_only: bool,
    ) -> Result<Vec<Notification>, WorkflowError> {
        Ok(self.notifications.list(actor.id, unread_only).await?)
    }

    pub async fn unread_count(&self, actor: &Actor) -> Result<i64, WorkflowError> {
        Ok(self.notifications.unread_count(actor.id).await?)
    }

    /// Only the notification's owner can mark it read.
    pub async fn mark_read(&self, actor: &Actor, notification_id: i64) -> Result<(), WorkflowError> {
        if !self.notifications.mark_read(notification_id, actor.id).await? {
            return Err(WorkflowError::NotFound(format!(
                "Notification {notification_id} not found"
            )));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, actor: &Actor) -> Result<u64, WorkflowError> {
        Ok(self.notifications.mark_all_read(actor.id).await?)
    }

    async fn load(&self, id: i64) -> Result<LeaveRequest, WorkflowError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| WorkflowError::leave_not_found(id))
    }

    async fn check_leave_type(&self, leave_type_id: Option<i64>) -> Result<(), WorkflowError> {
        let Some(id) = leave_type_id else {
            return Ok(());
        };
        match self.store.leave_type(id).await? {
            Some(_) => Ok(()),
            None => Err(WorkflowError::Validation(format!("Invalid leave type: {id}"))),
        }
    }

    fn require_approver(&self, actor: &Actor) -> Result<(), WorkflowError> {
        if actor.is_approver() {
            Ok(())
        } else {
            Err(WorkflowError::Authorization(
                "Admin, Manager or HR access required".to_string(),
            ))
        }
    }

    fn visible_to(&self, actor: &Actor, search: Option<&str>) -> LeaveQuery {
        LeaveQuery {
            owner_id: if actor.is_approver() { None } else { Some(actor.id) },
            search: validate::normalize_search(search),
            limit: None,
            offset: 0,
        }
    }
}
