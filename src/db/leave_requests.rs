use sqlx::PgPool;

use crate::models::{LeaveRequest, LeaveRequestWithOwner, LeaveStats, LeaveStatus};
use crate::workflow::ports::{LeaveFields, LeaveQuery, NewLeaveRequest};

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: &NewLeaveRequest,
) -> Result<LeaveRequest, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        "INSERT INTO leave_requests (owner_id, start_date, end_date, reason, leave_type_id)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(new.owner_id)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(&new.reason)
    .bind(new.leave_type_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Compare-and-set on status: only a pending row moves. `None` means the guard failed.
pub async fn set_status_if_pending<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
    status: LeaveStatus,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        "UPDATE leave_requests
         SET status = $2, version = version + 1, updated_at = now()
         WHERE id = $1 AND status = 'Pending'
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(executor)
    .await
}

/// Overwrite fields of a pending row, optionally only at `expected_version`.
pub async fn update_if_pending<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
    fields: &LeaveFields,
    expected_version: Option<i32>,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        "UPDATE leave_requests
         SET start_date = $2, end_date = $3, reason = $4, leave_type_id = $5,
             version = version + 1, updated_at = now()
         WHERE id = $1 AND status = 'Pending'
           AND ($6::integer IS NULL OR version = $6)
         RETURNING *",
    )
    .bind(id)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(&fields.reason)
    .bind(fields.leave_type_id)
    .bind(expected_version)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(
    pool: &PgPool,
    query: &LeaveQuery,
) -> Result<Vec<LeaveRequestWithOwner>, sqlx::Error> {
    let pattern = query.search.as_deref().map(super::contains_pattern);

    sqlx::query_as::<_, LeaveRequestWithOwner>(
        "SELECT lr.*, u.first_name AS owner_first_name, u.last_name AS owner_last_name
         FROM leave_requests lr
         JOIN users u ON u.id = lr.owner_id
         WHERE ($1::uuid IS NULL OR lr.owner_id = $1)
           AND ($2::text IS NULL
                OR lr.status ILIKE $2
                OR u.first_name ILIKE $2
                OR u.last_name ILIKE $2)
         ORDER BY lr.requested_at DESC, lr.id DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(query.owner_id)
    .bind(pattern)
    .bind(query.limit)
    .bind(query.offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, query: &LeaveQuery) -> Result<i64, sqlx::Error> {
    let pattern = query.search.as_deref().map(super::contains_pattern);

    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM leave_requests lr
         JOIN users u ON u.id = lr.owner_id
         WHERE ($1::uuid IS NULL OR lr.owner_id = $1)
           AND ($2::text IS NULL
                OR lr.status ILIKE $2
                OR u.first_name ILIKE $2
                OR u.last_name ILIKE $2)",
    )
    .bind(query.owner_id)
    .bind(pattern)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn stats(pool: &PgPool) -> Result<LeaveStats, sqlx::Error> {
    let rows: Vec<(LeaveStatus, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM leave_requests GROUP BY status")
            .fetch_all(pool)
            .await?;

    let mut stats = LeaveStats::default();
    for (status, count) in rows {
        stats.total += count;
        match status {
            LeaveStatus::Pending => stats.pending = count,
            LeaveStatus::Approved => stats.approved = count,
            LeaveStatus::Rejected => stats.rejected = count,
        }
    }
    Ok(stats)
}
