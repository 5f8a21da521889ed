use sqlx::PgPool;

use crate::models::LeaveType;

pub async fn list(pool: &PgPool) -> Result<Vec<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
