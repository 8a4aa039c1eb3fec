mod campaigns;
mod config;
mod db;
mod delivery;
mod discovery;
mod errors;
mod generation;
mod models;
mod routes;
mod state;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::delivery::mailer::Mailer;
use crate::discovery::apollo::ApolloSource;
use crate::discovery::fixtures::FixtureSource;
use crate::discovery::source::LeadSource;
use crate::routes::build_router;
use crate::state::AppState;
use crate::validation::engine::EmailValidator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prospect API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Select the lead source from credential presence
    let source: Arc<dyn LeadSource> = match config.apollo_api_key.clone() {
        Some(api_key) => {
            info!("Lead source: Apollo (live)");
            Arc::new(ApolloSource::new(api_key, config.builtwith_api_key.clone()))
        }
        None => {
            warn!("APOLLO_API_KEY not set; using fixture lead source (demo mode)");
            Arc::new(FixtureSource)
        }
    };

    // Initialize validation and delivery
    let validator = Arc::new(EmailValidator::new(&config));
    let mailer = Arc::new(Mailer::new(&config)?);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        source,
        validator,
        mailer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
