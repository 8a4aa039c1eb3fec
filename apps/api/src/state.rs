use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::delivery::mailer::Mailer;
use crate::discovery::source::LeadSource;
use crate::validation::engine::EmailValidator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable lead source. ApolloSource when APOLLO_API_KEY is set,
    /// FixtureSource otherwise (deterministic demo mode).
    pub source: Arc<dyn LeadSource>,
    pub validator: Arc<EmailValidator>,
    pub mailer: Arc<Mailer>,
}
