pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::campaigns::handlers as campaigns;
use crate::delivery::handlers as delivery;
use crate::discovery::handlers as discovery;
use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::validation::handlers as validation;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Lead Discovery API
        .route("/api/v1/leads/discover", post(discovery::handle_discover))
        .route(
            "/api/v1/leads/companies",
            get(discovery::handle_list_companies),
        )
        .route(
            "/api/v1/leads/companies/:id/contacts",
            get(discovery::handle_company_contacts),
        )
        .route("/api/v1/leads/stats", get(discovery::handle_stats))
        // Email Generation API
        .route(
            "/api/v1/emails/generate",
            post(generation::handle_generate_emails),
        )
        .route(
            "/api/v1/emails/preview",
            post(generation::handle_preview_email),
        )
        // Email Delivery API
        .route("/api/v1/emails/send", post(delivery::handle_send_emails))
        .route(
            "/api/v1/emails/test-config",
            post(delivery::handle_test_config),
        )
        // Email Validation API
        .route(
            "/api/v1/validation/email",
            post(validation::handle_validate_email),
        )
        .route(
            "/api/v1/validation/batch",
            post(validation::handle_validate_batch),
        )
        .route(
            "/api/v1/validation/contacts",
            post(validation::handle_validate_contacts),
        )
        .route(
            "/api/v1/validation/recompute-scores",
            post(validation::handle_recompute_scores),
        )
        .route(
            "/api/v1/validation/filter",
            post(validation::handle_filter_contacts),
        )
        // Campaign API
        .route(
            "/api/v1/campaigns",
            post(campaigns::handle_create_campaign).get(campaigns::handle_list_campaigns),
        )
        .route(
            "/api/v1/campaigns/templates",
            get(campaigns::handle_list_templates),
        )
        .route(
            "/api/v1/campaigns/:id",
            put(campaigns::handle_update_campaign),
        )
        .with_state(state)
}
