use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AuditAction, AuditLogEntry};
use crate::workflow::ports::AuditQuery;

/// Append an entry. A `leave_request_id` whose row no longer exists is stored as
/// null; the id itself is kept in `subject_id`.
pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    action: AuditAction,
    actor_id: Uuid,
    leave_request_id: Option<i64>,
    details: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs (action, actor_id, leave_request_id, subject_id, details)
         VALUES ($1, $2, (SELECT id FROM leave_requests WHERE id = $3), $3, $4)",
    )
    .bind(action)
    .bind(actor_id)
    .bind(leave_request_id)
    .bind(details)
    .execute(executor)
    .await?;
    Ok(())
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub async fn query(pool: &PgPool, filter: &AuditQuery) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
    let from = filter.date_from.map(start_of);
    // Whole `date_to` day is included.
    let until = filter
        .date_to
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(start_of);
    let pattern = filter.search.as_deref().map(super::contains_pattern);

    sqlx::query_as::<_, AuditLogEntry>(
        "SELECT a.id, a.action, a.actor_id,
                (u.first_name || ' ' || u.last_name) AS actor_name,
                a.leave_request_id, a.subject_id, a.details, a.created_at
         FROM audit_logs a
         JOIN users u ON u.id = a.actor_id
         WHERE ($1::timestamptz IS NULL OR a.created_at >= $1)
           AND ($2::timestamptz IS NULL OR a.created_at < $2)
           AND ($3::text IS NULL
                OR a.action ILIKE $3
                OR (u.first_name || ' ' || u.last_name) ILIKE $3
                OR u.email ILIKE $3)
           AND ($4::bigint IS NULL OR a.subject_id = $4)
         ORDER BY a.created_at DESC, a.id DESC",
    )
    .bind(from)
    .bind(until)
    .bind(pattern)
    .bind(filter.leave_request_id)
    .fetch_all(pool)
    .await
}
