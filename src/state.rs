use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::realtime::EventHub;
use crate::workflow::LeaveWorkflow;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub workflow: LeaveWorkflow,
    pub events: Arc<EventHub>,
    pub login_limiter: Arc<LoginRateLimiter>,
}
