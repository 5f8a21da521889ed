//! Postgres-backed implementations of the workflow ports.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{
    AuditLogEntry, LeaveRequest, LeaveRequestWithOwner, LeaveStats, LeaveStatus, LeaveType,
    Notification, Role, User,
};
use crate::workflow::ports::{
    AuditLog, AuditQuery, AuditRecord, Directory, Guarded, LeaveFields, LeaveQuery, LeaveStore,
    NewAuditEntry, NewLeaveRequest, NotificationStore, StoreError,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// After a guarded write matched no row, work out whether the row is gone
    /// or just failed the guard.
    async fn diagnose(&self, id: i64) -> Result<Guarded, StoreError> {
        Ok(match db::leave_requests::find_by_id(&self.pool, id).await? {
            Some(current) => Guarded::Blocked(current),
            None => Guarded::Missing,
        })
    }
}

#[async_trait]
impl LeaveStore for PgStore {
    async fn insert(
        &self,
        request: &NewLeaveRequest,
        audit: &AuditRecord,
    ) -> Result<LeaveRequest, StoreError> {
        let mut tx = self.pool.begin().await?;
        let created = db::leave_requests::insert(&mut *tx, request).await?;
        db::audit::insert(
            &mut *tx,
            audit.action,
            audit.actor_id,
            Some(created.id),
            &audit.details,
        )
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find(&self, id: i64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(db::leave_requests::find_by_id(&self.pool, id).await?)
    }

    async fn transition(
        &self,
        id: i64,
        to: LeaveStatus,
        audit: &AuditRecord,
    ) -> Result<Guarded, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(updated) = db::leave_requests::set_status_if_pending(&mut *tx, id, to).await?
        else {
            tx.rollback().await?;
            return self.diagnose(id).await;
        };
        db::audit::insert(&mut *tx, audit.action, audit.actor_id, Some(id), &audit.details).await?;
        tx.commit().await?;
        Ok(Guarded::Applied(updated))
    }

    async fn update_fields(
        &self,
        id: i64,
        fields: &LeaveFields,
        expected_version: Option<i32>,
        audit: &AuditRecord,
    ) -> Result<Guarded, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(updated) =
            db::leave_requests::update_if_pending(&mut *tx, id, fields, expected_version).await?
        else {
            tx.rollback().await?;
            return self.diagnose(id).await;
        };
        db::audit::insert(&mut *tx, audit.action, audit.actor_id, Some(id), &audit.details).await?;
        tx.commit().await?;
        Ok(Guarded::Applied(updated))
    }

    async fn delete(&self, id: i64, audit: &AuditRecord) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Written first so it references the row; the FK then nulls the reference.
        db::audit::insert(&mut *tx, audit.action, audit.actor_id, Some(id), &audit.details).await?;
        if !db::leave_requests::delete(&mut *tx, id).await? {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn list(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequestWithOwner>, StoreError> {
        Ok(db::leave_requests::list(&self.pool, query).await?)
    }

    async fn count(&self, query: &LeaveQuery) -> Result<i64, StoreError> {
        Ok(db::leave_requests::count(&self.pool, query).await?)
    }

    async fn stats(&self) -> Result<LeaveStats, StoreError> {
        Ok(db::leave_requests::stats(&self.pool).await?)
    }

    async fn leave_type(&self, id: i64) -> Result<Option<LeaveType>, StoreError> {
        Ok(db::leave_types::find_by_id(&self.pool, id).await?)
    }
}

#[async_trait]
impl AuditLog for PgStore {
    async fn append(&self, entry: &NewAuditEntry) -> Result<(), StoreError> {
        db::audit::insert(
            &self.pool,
            entry.action,
            entry.actor_id,
            entry.leave_request_id,
            &entry.details,
        )
        .await?;
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(db::audit::query(&self.pool, query).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, user_id: Uuid, message: &str) -> Result<Notification, StoreError> {
        Ok(db::notifications::create(&self.pool, user_id, message).await?)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(db::notifications::list_for_user(&self.pool, user_id, unread_only).await?)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, StoreError> {
        Ok(db::notifications::count_unread(&self.pool, user_id).await?)
    }

    async fn mark_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(db::notifications::mark_read(&self.pool, id, user_id).await?)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        Ok(db::notifications::mark_all_read(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl Directory for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(db::users::find_by_id(&self.pool, id).await?)
    }

    async fn users_in_roles(&self, roles: &[Role]) -> Result<Vec<User>, StoreError> {
        let names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        Ok(db::users::list_in_roles(&self.pool, &names).await?)
    }
}
