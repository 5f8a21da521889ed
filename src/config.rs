use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub page_size: i64,
    pub email_timeout: Duration,
    pub event_capacity: usize,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Account created on startup when the user table is empty.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| format!("Missing required environment variable: {key}"))
        };
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let host: IpAddr = or("LEAVEDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid LEAVEDESK_HOST: {e}"))?;

        let port: u16 = or("LEAVEDESK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid LEAVEDESK_PORT: {e}"))?;

        let base_url = or("LEAVEDESK_BASE_URL", &format!("http://{host}:{port}"));

        let page_size: i64 = or("LEAVEDESK_PAGE_SIZE", "5")
            .parse()
            .map_err(|e| format!("Invalid LEAVEDESK_PAGE_SIZE: {e}"))?;
        if page_size < 1 {
            return Err("Invalid LEAVEDESK_PAGE_SIZE: must be at least 1".to_string());
        }

        let email_timeout_secs: u64 = or("LEAVEDESK_EMAIL_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid LEAVEDESK_EMAIL_TIMEOUT_SECS: {e}"))?;

        let event_capacity: usize = or("LEAVEDESK_EVENT_CAPACITY", "256")
            .parse()
            .map_err(|e| format!("Invalid LEAVEDESK_EVENT_CAPACITY: {e}"))?;

        let log_level = or("LEAVEDESK_LOG_LEVEL", "info");

        let smtp = match (
            lookup("LEAVEDESK_SMTP_HOST"),
            lookup("LEAVEDESK_SMTP_PORT"),
            lookup("LEAVEDESK_SMTP_USER"),
            lookup("LEAVEDESK_SMTP_PASS"),
            lookup("LEAVEDESK_SMTP_FROM"),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid LEAVEDESK_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let bootstrap_admin = match (
            lookup("LEAVEDESK_ADMIN_EMAIL"),
            lookup("LEAVEDESK_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            page_size,
            email_timeout: Duration::from_secs(email_timeout_secs),
            event_capacity,
            log_level,
            smtp,
            bootstrap_admin,
        })
    }
}
