//! Axum route handlers for the Email Delivery API.

use std::time::Duration;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::delivery::mailer::{OutboundEmail, SendOutcome};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendEmailsRequest {
    pub emails: Vec<OutboundEmail>,
    /// Dry run: no transport calls, synthetic per-item outcomes.
    #[serde(default)]
    pub test_mode: bool,
    /// Overrides the configured inter-send delay for this batch.
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailsResponse {
    pub results: Vec<SendOutcome>,
    pub sent: usize,
    pub failed: usize,
    pub test_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct TestConfigResponse {
    pub success: bool,
    pub method: &'static str,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/emails/send
///
/// Sends a batch in order with pacing between sends. Contacts tied to a
/// successful send are marked contacted with a timestamp.
pub async fn handle_send_emails(
    State(state): State<AppState>,
    Json(request): Json<SendEmailsRequest>,
) -> Result<Json<SendEmailsResponse>, AppError> {
    if request.emails.is_empty() {
        return Err(AppError::Validation("emails cannot be empty".to_string()));
    }
    for (i, email) in request.emails.iter().enumerate() {
        if email.to_email.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "emails[{i}].to_email is required"
            )));
        }
        if email.subject.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "emails[{i}].subject is required"
            )));
        }
        if email.body.trim().is_empty() {
            return Err(AppError::Validation(format!("emails[{i}].body is required")));
        }
    }

    let results = if request.test_mode {
        request
            .emails
            .iter()
            .enumerate()
            .map(|(i, email)| SendOutcome {
                success: true,
                method: state.mailer.method(),
                message: Some("Test mode: email not sent".to_string()),
                error: None,
                to_email: email.to_email.clone(),
                subject: email.subject.clone(),
                sent_at: Utc::now(),
                batch_index: Some(i),
                contact_id: email.contact_id,
                company_id: email.company_id,
            })
            .collect()
    } else {
        let delay = Duration::from_millis(
            request.delay_ms.unwrap_or(state.config.scoring.send_delay_ms),
        );
        let results = state.mailer.send_batch(&request.emails, delay).await;
        mark_contacted(&state, &results).await;
        results
    };

    let sent = results.iter().filter(|r| r.success).count();

    Ok(Json(SendEmailsResponse {
        failed: results.len() - sent,
        sent,
        results,
        test_mode: request.test_mode,
    }))
}

/// POST /api/v1/emails/test-config
///
/// Verifies the configured transport without sending anything.
pub async fn handle_test_config(
    State(state): State<AppState>,
) -> Result<Json<TestConfigResponse>, AppError> {
    let method = state.mailer.method();
    match state.mailer.test_connection().await {
        Ok(message) => Ok(Json(TestConfigResponse {
            success: true,
            method,
            message,
        })),
        Err(e) => Ok(Json(TestConfigResponse {
            success: false,
            method,
            message: e.to_string(),
        })),
    }
}

/// Marks contacts behind successful sends as contacted. Bookkeeping only;
/// a failed update never fails the send that already happened.
async fn mark_contacted(state: &AppState, results: &[SendOutcome]) {
    for outcome in results.iter().filter(|r| r.success) {
        let Some(contact_id) = outcome.contact_id else {
            continue;
        };
        let updated = sqlx::query(
            "UPDATE contacts
             SET contacted = TRUE, contact_date = $1, updated_at = $1
             WHERE id = $2",
        )
        .bind(outcome.sent_at)
        .bind(contact_id)
        .execute(&state.db)
        .await;

        if let Err(e) = updated {
            warn!("Failed to mark contact {contact_id} as contacted: {e}");
        }
    }
}
