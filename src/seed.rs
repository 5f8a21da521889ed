use sqlx::PgPool;

use crate::auth::password;
use crate::config::BootstrapAdmin;
use crate::db;
use crate::models::Role;

/// Create the configured admin account if nobody has been registered yet.
/// Returns whether an account was created.
pub async fn bootstrap_admin(pool: &PgPool, admin: &BootstrapAdmin) -> Result<bool, String> {
    let pw_hash = password::hash(&admin.password)?;

    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;
    // Serialises concurrent starts against the same database.
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await
        .map_err(|e| e.to_string())?;

    if db::users::count_all(&mut *tx).await.map_err(|e| e.to_string())? > 0 {
        return Ok(false);
    }

    let roles = vec![Role::Admin.as_str().to_string(), Role::User.as_str().to_string()];
    let user = db::users::create(&mut *tx, &admin.email, &pw_hash, "System", "Admin", &roles)
        .await
        .map_err(|e| format!("Failed to create admin: {e}"))?;
    tx.commit().await.map_err(|e| e.to_string())?;

    tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
    Ok(true)
}
