//! Axum route handlers for the Email Validation API.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::discovery::scoring::decision_maker_score;
use crate::errors::AppError;
use crate::models::company::ContactRow;
use crate::state::AppState;
use crate::validation::engine::ValidationReport;
use crate::validation::reputation::reputation_score;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ValidateEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateBatchRequest {
    pub emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateBatchResponse {
    pub results: Vec<ValidationReport>,
    pub total: usize,
    pub valid: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateContactsRequest {
    /// Explicit contacts to validate. Absent: every not-yet-validated
    /// contact, optionally scoped to one company.
    pub contact_ids: Option<Vec<i64>>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ValidatedContact {
    pub contact_id: i64,
    pub email: String,
    pub verdict: String,
    pub confidence_score: f64,
    pub decision_maker_score: f64,
}

#[derive(Debug, Serialize)]
pub struct ValidateContactsResponse {
    pub results: Vec<ValidatedContact>,
    pub validated: usize,
    pub failed: usize,
    pub errors: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct RecomputeScoresResponse {
    pub updated: usize,
}

#[derive(Debug, Deserialize)]
pub struct FilterContactsRequest {
    #[serde(default = "default_min_score")]
    pub min_decision_maker_score: f64,
    /// Allowed validation verdicts.
    #[serde(default = "default_verdicts")]
    pub verdicts: Vec<String>,
}

fn default_min_score() -> f64 {
    0.5
}

fn default_verdicts() -> Vec<String> {
    vec!["valid".to_string(), "risky".to_string()]
}

#[derive(Debug, Serialize)]
pub struct FilterContactsResponse {
    pub contacts: Vec<ContactRow>,
    pub total: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/validation/email
///
/// Validates a single address without touching the database.
pub async fn handle_validate_email(
    State(state): State<AppState>,
    Json(request): Json<ValidateEmailRequest>,
) -> Result<Json<ValidationReport>, AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("email cannot be empty".to_string()));
    }

    let report = state.validator.validate(&request.email).await;
    Ok(Json(report))
}

/// POST /api/v1/validation/batch
///
/// Validates a list of addresses. Validation itself never fails, so every
/// input produces a report.
pub async fn handle_validate_batch(
    State(state): State<AppState>,
    Json(request): Json<ValidateBatchRequest>,
) -> Result<Json<ValidateBatchResponse>, AppError> {
    if request.emails.is_empty() {
        return Err(AppError::Validation("emails cannot be empty".to_string()));
    }

    let mut results = Vec::with_capacity(request.emails.len());
    for email in &request.emails {
        results.push(state.validator.validate(email).await);
    }

    let valid = results.iter().filter(|r| r.is_valid).count();
    Ok(Json(ValidateBatchResponse {
        total: results.len(),
        valid,
        results,
    }))
}

/// POST /api/v1/validation/contacts
///
/// Validates stored contacts, writes the verdict back, and blends the
/// address reputation into each contact's decision-maker score. With no
/// explicit ids, targets every not-yet-validated contact (optionally one
/// company's). Per-item isolation: one missing contact or failed write
/// does not stop the batch.
pub async fn handle_validate_contacts(
    State(state): State<AppState>,
    Json(request): Json<ValidateContactsRequest>,
) -> Result<Json<ValidateContactsResponse>, AppError> {
    let contact_ids = match request.contact_ids {
        Some(ids) if ids.is_empty() => {
            return Err(AppError::Validation(
                "contact_ids cannot be empty".to_string(),
            ));
        }
        Some(ids) => ids,
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM contacts
                 WHERE email_validated = FALSE
                   AND ($1::bigint IS NULL OR company_id = $1)
                 ORDER BY id",
            )
            .bind(request.company_id)
            .fetch_all(&state.db)
            .await?
        }
    };

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for contact_id in &contact_ids {
        match validate_one_contact(&state, *contact_id).await {
            Ok(validated) => results.push(validated),
            Err(e) => errors.push(json!({ "contact_id": contact_id, "error": e.to_string() })),
        }
    }

    Ok(Json(ValidateContactsResponse {
        validated: results.len(),
        failed: errors.len(),
        results,
        errors,
    }))
}

/// POST /api/v1/validation/recompute-scores
///
/// Re-runs the title ladder for every contact, blending in address
/// reputation where the address has actually been validated. Used after
/// tuning the scoring rules.
pub async fn handle_recompute_scores(
    State(state): State<AppState>,
) -> Result<Json<RecomputeScoresResponse>, AppError> {
    let rows = sqlx::query_as::<_, ContactWithSize>(
        "SELECT c.id, c.email, c.job_title, c.email_validated, co.employee_count
         FROM contacts c
         JOIN companies co ON co.id = c.company_id",
    )
    .fetch_all(&state.db)
    .await?;

    let mut updated = 0;
    for row in &rows {
        let title = row.job_title.as_deref().unwrap_or("");
        let score = recomputed_score(
            title,
            row.employee_count.unwrap_or(50),
            &row.email,
            row.email_validated,
        );

        sqlx::query(
            "UPDATE contacts SET decision_maker_score = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(score)
        .bind(Utc::now())
        .bind(row.id)
        .execute(&state.db)
        .await?;
        updated += 1;
    }

    Ok(Json(RecomputeScoresResponse { updated }))
}

/// POST /api/v1/validation/filter
///
/// Returns contacts passing a minimum decision-maker score whose stored
/// validation verdict is in the allowed set, best first.
pub async fn handle_filter_contacts(
    State(state): State<AppState>,
    Json(request): Json<FilterContactsRequest>,
) -> Result<Json<FilterContactsResponse>, AppError> {
    let min_score = request.min_decision_maker_score;
    if !(0.0..=1.0).contains(&min_score) {
        return Err(AppError::Validation(
            "min_decision_maker_score must be within [0, 1]".to_string(),
        ));
    }
    let verdicts = request.verdicts;

    let contacts = sqlx::query_as::<_, ContactRow>(
        "SELECT * FROM contacts
         WHERE decision_maker_score >= $1
           AND email_validated = TRUE
           AND email_validation_result = ANY($2)
         ORDER BY decision_maker_score DESC",
    )
    .bind(min_score)
    .bind(&verdicts)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(FilterContactsResponse {
        total: contacts.len(),
        contacts,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Internals
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct ContactWithSize {
    id: i64,
    email: String,
    job_title: Option<String>,
    email_validated: bool,
    employee_count: Option<i32>,
}

/// Fresh decision-maker score for a contact: the title ladder, averaged
/// with address reputation once the address has been validated.
fn recomputed_score(title: &str, employee_count: i32, email: &str, validated: bool) -> f64 {
    let title_score = decision_maker_score(title, employee_count);
    if validated {
        (title_score + reputation_score(email)) / 2.0
    } else {
        title_score
    }
}

async fn validate_one_contact(
    state: &AppState,
    contact_id: i64,
) -> Result<ValidatedContact, AppError> {
    let contact = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1")
        .bind(contact_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact {contact_id} not found")))?;

    let report = state.validator.validate(&contact.email).await;

    // Blend address reputation into the title-derived score so identical
    // titles rank by address quality.
    let blended = (contact.decision_maker_score + reputation_score(&contact.email)) / 2.0;

    sqlx::query(
        "UPDATE contacts
         SET email_validated = TRUE,
             email_validation_result = $1,
             decision_maker_score = $2,
             updated_at = $3
         WHERE id = $4",
    )
    .bind(&report.verdict)
    .bind(blended)
    .bind(Utc::now())
    .bind(contact_id)
    .execute(&state.db)
    .await?;

    Ok(ValidatedContact {
        contact_id,
        email: contact.email,
        verdict: report.verdict,
        confidence_score: report.confidence_score,
        decision_maker_score: blended,
    })
}
