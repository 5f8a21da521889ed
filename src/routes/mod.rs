pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod leave_requests;
pub mod leave_types;
pub mod notifications;
pub mod users;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        // Users
        .route("/api/v1/users", get(users::list).post(users::create))
        .route("/api/v1/users/{id}/roles", put(users::update_roles))
        // Leave types
        .route("/api/v1/leave-types", get(leave_types::list))
        // Leave requests
        .route(
            "/api/v1/leave-requests",
            get(leave_requests::list).post(leave_requests::create),
        )
        .route("/api/v1/leave-requests/export", get(leave_requests::export))
        .route(
            "/api/v1/leave-requests/{id}",
            get(leave_requests::get)
                .put(leave_requests::update)
                .delete(leave_requests::delete),
        )
        .route(
            "/api/v1/leave-requests/{id}/approve",
            post(leave_requests::approve),
        )
        .route(
            "/api/v1/leave-requests/{id}/reject",
            post(leave_requests::reject),
        )
        // Audit
        .route("/api/v1/audit-logs", get(audit::list))
        .route("/api/v1/audit-logs/export", get(audit::export))
        // Notifications
        .route("/api/v1/notifications", get(notifications::list))
        .route(
            "/api/v1/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            post(notifications::mark_read),
        )
        // Dashboard
        .route("/api/v1/dashboard/stats", get(dashboard::stats))
        // Live events
        .route("/api/v1/events", get(events::stream))
}
