use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Third-party credentials are all optional: when a credential is absent the
/// engine that would use it falls back to a degraded mode (fixture data for
/// discovery, skipped provider check for validation, SMTP for delivery)
/// rather than failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,

    pub apollo_api_key: Option<String>,
    pub builtwith_api_key: Option<String>,
    pub zerobounce_api_key: Option<String>,
    pub hunter_api_key: Option<String>,
    pub sendgrid_api_key: Option<String>,

    pub smtp: SmtpConfig,
    pub scoring: ScoringConfig,
}

/// SMTP relay settings used when no SendGrid key is configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: Option<String>,
}

/// Score weights, thresholds, and pacing delays the pipeline was tuned
/// with. Configuration, not derived quantities.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Confidence at or above which a self-validated email is "valid".
    pub valid_confidence_threshold: f64,
    pub format_weight: f64,
    pub domain_weight: f64,
    pub mailbox_weight: f64,
    /// Delay between consecutive outbound discovery queries.
    pub discovery_delay_ms: u64,
    /// Delay between consecutive email sends in a batch.
    pub send_delay_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            valid_confidence_threshold: 0.7,
            format_weight: 0.3,
            domain_weight: 0.4,
            mailbox_weight: 0.3,
            discovery_delay_ms: 1000,
            send_delay_ms: 2000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            apollo_api_key: optional_env("APOLLO_API_KEY"),
            builtwith_api_key: optional_env("BUILTWITH_API_KEY"),
            zerobounce_api_key: optional_env("ZEROBOUNCE_API_KEY"),
            hunter_api_key: optional_env("HUNTER_API_KEY"),
            sendgrid_api_key: optional_env("SENDGRID_API_KEY"),
            smtp: SmtpConfig::from_env()?,
            scoring: ScoringConfig::default(),
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Self> {
        Ok(SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse::<u16>()
                .context("SMTP_PORT must be a valid port number")?,
            username: optional_env("SMTP_USERNAME"),
            password: optional_env("SMTP_PASSWORD"),
            from_email: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "outreach@example.com".to_string()),
            from_name: optional_env("SMTP_FROM_NAME"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns None for unset or empty variables so that `FOO=` behaves like unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
