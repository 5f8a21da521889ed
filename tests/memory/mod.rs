//! In-memory implementations of every workflow port.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Utc};
use uuid::Uuid;

use leavedesk::models::{
    AuditAction, AuditLogEntry, LeaveRequest, LeaveRequestWithOwner, LeaveStats, LeaveStatus,
    LeaveType, Notification, Role, RoleSet, User,
};
use leavedesk::realtime::LiveEvent;
use leavedesk::workflow::ports::{
    AuditLog, AuditQuery, AuditRecord, Broadcaster, Directory, Guarded, LeaveFields, LeaveQuery,
    LeaveStore, Mailer, NewAuditEntry, NewLeaveRequest, NotificationStore, StoreError,
};
use leavedesk::workflow::{Actor, LeaveWorkflow, WorkflowDeps, WorkflowSettings};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    leave_types: Vec<LeaveType>,
    requests: BTreeMap<i64, LeaveRequest>,
    audit: Vec<AuditLogEntry>,
    notifications: Vec<Notification>,
    next_request_id: i64,
    next_audit_id: i64,
    next_notification_id: i64,
    fail_audit: bool,
    fail_notifications: bool,
}

impl Tables {
    fn user_name(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(User::display_name)
            .unwrap_or_default()
    }

    fn write_audit(
        &mut self,
        action: AuditAction,
        actor_id: Uuid,
        leave_request_id: Option<i64>,
        details: &str,
    ) -> Result<(), StoreError> {
        if self.fail_audit {
            return Err(StoreError::Unavailable("audit log offline".to_string()));
        }
        let live_reference = leave_request_id.filter(|id| self.requests.contains_key(id));
        self.next_audit_id += 1;
        let entry = AuditLogEntry {
            id: self.next_audit_id,
            action,
            actor_id,
            actor_name: self.user_name(actor_id),
            leave_request_id: live_reference,
            subject_id: leave_request_id,
            details: details.to_string(),
            created_at: Utc::now(),
        };
        self.audit.push(entry);
        Ok(())
    }

    fn with_owner(&self, request: &LeaveRequest) -> LeaveRequestWithOwner {
        let owner = self.users.iter().find(|u| u.id == request.owner_id);
        LeaveRequestWithOwner {
            request: request.clone(),
            owner_first_name: owner.map(|u| u.first_name.clone()).unwrap_or_default(),
            owner_last_name: owner.map(|u| u.last_name.clone()).unwrap_or_default(),
        }
    }

    fn matching(&self, query: &LeaveQuery) -> Vec<LeaveRequestWithOwner> {
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut rows: Vec<_> = self
            .requests
            .values()
            .filter(|r| query.owner_id.is_none_or(|owner| r.owner_id == owner))
            .map(|r| self.with_owner(r))
            .filter(|row| match &needle {
                None => true,
                Some(needle) => [
                    row.request.status.as_str(),
                    row.owner_first_name.as_str(),
                    row.owner_last_name.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            })
            .collect();
        rows.sort_by(|a, b| {
            (b.request.requested_at, b.request.id).cmp(&(a.request.requested_at, a.request.id))
        });
        rows
    }

    /// Apply the pending guard shared by status changes and edits.
    fn guard(&self, id: i64, expected_version: Option<i32>) -> Result<(), Guarded> {
        match self.requests.get(&id) {
            None => Err(Guarded::Missing),
            Some(current)
                if !current.is_pending()
                    || expected_version.is_some_and(|v| v != current.version) =>
            {
                Err(Guarded::Blocked(current.clone()))
            }
            Some(_) => Ok(()),
        }
    }
}

/// Leave store, audit log, notification store and directory in one place,
/// mirroring how the Postgres store backs all four.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        {
            let mut t = store.tables.lock().unwrap();
            t.leave_types = ["Annual", "Sick", "Unpaid"]
                .iter()
                .enumerate()
                .map(|(i, name)| LeaveType {
                    id: i as i64 + 1,
                    name: name.to_string(),
                })
                .collect();
        }
        store
    }

    pub fn add_user(&self, first_name: &str, last_name: &str, roles: &[Role]) -> Actor {
        let id = Uuid::now_v7();
        let role_set: RoleSet = roles.iter().copied().collect();
        let user = User {
            id,
            email: format!("{}@example.com", first_name.to_lowercase()),
            password_hash: String::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            roles: role_set.names(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().users.push(user);
        Actor::new(id, role_set)
    }

    pub fn request(&self, id: i64) -> Option<LeaveRequest> {
        self.tables.lock().unwrap().requests.get(&id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.tables.lock().unwrap().audit.clone()
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.tables
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn all_notifications(&self) -> Vec<Notification> {
        self.tables.lock().unwrap().notifications.clone()
    }

    /// Drop a request without going through the workflow, as a concurrent
    /// delete would.
    pub fn remove_behind_the_back(&self, id: i64) {
        let mut t = self.tables.lock().unwrap();
        t.requests.remove(&id);
        for entry in t.audit.iter_mut() {
            if entry.leave_request_id == Some(id) {
                entry.leave_request_id = None;
            }
        }
    }

    /// Bump a request's version, as a concurrent edit would.
    pub fn touch_behind_the_back(&self, id: i64) {
        let mut t = self.tables.lock().unwrap();
        if let Some(request) = t.requests.get_mut(&id) {
            request.version += 1;
        }
    }

    /// Shift a request's audit entries back in time.
    pub fn age_audit_entries(&self, subject_id: i64, days: u64) {
        let mut t = self.tables.lock().unwrap();
        for entry in t.audit.iter_mut().filter(|e| e.subject_id == Some(subject_id)) {
            entry.created_at = entry.created_at - Days::new(days);
        }
    }

    pub fn fail_audit(&self, fail: bool) {
        self.tables.lock().unwrap().fail_audit = fail;
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.tables.lock().unwrap().fail_notifications = fail;
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(
        &self,
        request: &NewLeaveRequest,
        audit: &AuditRecord,
    ) -> Result<LeaveRequest, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.fail_audit {
            return Err(StoreError::Unavailable("audit log offline".to_string()));
        }
        t.next_request_id += 1;
        let now = Utc::now();
        let created = LeaveRequest {
            id: t.next_request_id,
            owner_id: request.owner_id,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason.clone(),
            status: LeaveStatus::Pending,
            leave_type_id: request.leave_type_id,
            version: 1,
            requested_at: now,
            updated_at: now,
        };
        t.requests.insert(created.id, created.clone());
        t.write_audit(audit.action, audit.actor_id, Some(created.id), &audit.details)?;
        Ok(created)
    }

    async fn find(&self, id: i64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.request(id))
    }

    async fn transition(
        &self,
        id: i64,
        to: LeaveStatus,
        audit: &AuditRecord,
    ) -> Result<Guarded, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if let Err(outcome) = t.guard(id, None) {
            return Ok(outcome);
        }
        t.write_audit(audit.action, audit.actor_id, Some(id), &audit.details)?;
        let Some(request) = t.requests.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        request.status = to;
        request.version += 1;
        request.updated_at = Utc::now();
        Ok(Guarded::Applied(request.clone()))
    }

    async fn update_fields(
        &self,
        id: i64,
        fields: &LeaveFields,
        expected_version: Option<i32>,
        audit: &AuditRecord,
    ) -> Result<Guarded, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if let Err(outcome) = t.guard(id, expected_version) {
            return Ok(outcome);
        }
        t.write_audit(audit.action, audit.actor_id, Some(id), &audit.details)?;
        let Some(request) = t.requests.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        request.start_date = fields.start_date;
        request.end_date = fields.end_date;
        request.reason = fields.reason.clone();
        request.leave_type_id = fields.leave_type_id;
        request.version += 1;
        request.updated_at = Utc::now();
        Ok(Guarded::Applied(request.clone()))
    }

    async fn delete(&self, id: i64, audit: &AuditRecord) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if !t.requests.contains_key(&id) {
            return Ok(false);
        }
        t.write_audit(audit.action, audit.actor_id, Some(id), &audit.details)?;
        t.requests.remove(&id);
        for entry in t.audit.iter_mut() {
            if entry.leave_request_id == Some(id) {
                entry.leave_request_id = None;
            }
        }
        Ok(true)
    }

    async fn list(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequestWithOwner>, StoreError> {
        let rows = self.tables.lock().unwrap().matching(query);
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(limit)
            .collect())
    }

    async fn count(&self, query: &LeaveQuery) -> Result<i64, StoreError> {
        Ok(self.tables.lock().unwrap().matching(query).len() as i64)
    }

    async fn stats(&self) -> Result<LeaveStats, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut stats = LeaveStats::default();
        for request in t.requests.values() {
            stats.total += 1;
            match request.status {
                LeaveStatus::Pending => stats.pending += 1,
                LeaveStatus::Approved => stats.approved += 1,
                LeaveStatus::Rejected => stats.rejected += 1,
            }
        }
        Ok(stats)
    }

    async fn leave_type(&self, id: i64) -> Result<Option<LeaveType>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.leave_types.iter().find(|lt| lt.id == id).cloned())
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn append(&self, entry: &NewAuditEntry) -> Result<(), StoreError> {
        self.tables.lock().unwrap().write_audit(
            entry.action,
            entry.actor_id,
            entry.leave_request_id,
            &entry.details,
        )
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, StoreError> {
        let t = self.tables.lock().unwrap();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut entries: Vec<_> = t
            .audit
            .iter()
            .filter(|e| {
                query
                    .date_from
                    .is_none_or(|from| e.created_at.date_naive() >= from)
            })
            .filter(|e| query.date_to.is_none_or(|to| e.created_at.date_naive() <= to))
            .filter(|e| query.leave_request_id.is_none_or(|id| e.subject_id == Some(id)))
            .filter(|e| match &needle {
                None => true,
                Some(needle) => {
                    e.action.as_str().to_lowercase().contains(needle.as_str())
                        || e.actor_name.to_lowercase().contains(needle.as_str())
                }
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(entries)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, user_id: Uuid, message: &str) -> Result<Notification, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.fail_notifications {
            return Err(StoreError::Unavailable("notifications offline".to_string()));
        }
        assert!(message.chars().count() <= 250, "message exceeds column limit");
        t.next_notification_id += 1;
        let notification = Notification {
            id: t.next_notification_id,
            user_id,
            message: message.to_string(),
            is_read: false,
            created_at: Utc::now(),
        };
        t.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        match t
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let mut updated = 0;
        for n in t
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn users_in_roles(&self, roles: &[Role]) -> Result<Vec<User>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .filter(|u| {
                let held = u.role_set();
                roles.iter().any(|r| held.contains(*r))
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    events: Mutex<Vec<LiveEvent>>,
}

impl RecordingBroadcaster {
    pub fn events(&self) -> Vec<LiveEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, event: LiveEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub enum MailerMode {
    #[default]
    Deliver,
    Fail,
    Hang,
}

/// Records every attempted send as `(to, subject)`.
#[derive(Default)]
pub struct RecordingMailer {
    mode: MailerMode,
    attempts: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new(mode: MailerMode) -> Self {
        Self {
            mode,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), String> {
        self.attempts
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        match self.mode {
            MailerMode::Deliver => Ok(()),
            MailerMode::Fail => Err("SMTP relay refused connection".to_string()),
            MailerMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
        }
    }
}

pub struct Harness {
    pub workflow: LeaveWorkflow,
    pub store: MemoryStore,
    pub events: Arc<RecordingBroadcaster>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn harness() -> Harness {
    harness_with(MailerMode::Deliver, WorkflowSettings::default())
}

pub fn harness_with(mode: MailerMode, settings: WorkflowSettings) -> Harness {
    let store = MemoryStore::new();
    let events = Arc::new(RecordingBroadcaster::default());
    let mailer = Arc::new(RecordingMailer::new(mode));

    let workflow = LeaveWorkflow::new(
        WorkflowDeps {
            store: Arc::new(store.clone()),
            audit: Arc::new(store.clone()),
            notifications: Arc::new(store.clone()),
            directory: Arc::new(store.clone()),
            broadcaster: events.clone(),
            mailer: Some(mailer.clone()),
        },
        settings,
    );

    Harness {
        workflow,
        store,
        events,
        mailer,
    }
}
