pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod export;
pub mod models;
pub mod rate_limit;
pub mod realtime;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod workflow;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::SmtpMailer;
use crate::rate_limit::LoginRateLimiter;
use crate::realtime::EventHub;
use crate::state::{AppState, SharedState};
use crate::store::PgStore;
use crate::workflow::ports::Mailer;
use crate::workflow::{LeaveWorkflow, WorkflowDeps, WorkflowSettings};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Wire the Postgres store, event hub and optional mailer into the workflow engine.
pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let mailer: Option<Arc<dyn Mailer>> = config.smtp.as_ref().and_then(|smtp| {
        match SmtpMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("SMTP configured");
                Some(Arc::new(mailer) as Arc<dyn Mailer>)
            }
            Err(e) => {
                tracing::warn!("SMTP not available: {e}");
                None
            }
        }
    });

    let store = Arc::new(PgStore::new(pool.clone()));
    let events = Arc::new(EventHub::new(config.event_capacity));

    let workflow = LeaveWorkflow::new(
        WorkflowDeps {
            store: store.clone(),
            audit: store.clone(),
            notifications: store.clone(),
            directory: store,
            broadcaster: events.clone(),
            mailer,
        },
        WorkflowSettings {
            page_size: config.page_size,
            base_url: config.base_url.clone(),
            email_timeout: config.email_timeout,
        },
    );

    Arc::new(AppState {
        pool,
        config,
        workflow,
        events,
        login_limiter: Arc::new(LoginRateLimiter::new()),
    })
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
