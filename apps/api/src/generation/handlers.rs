//! Axum route handlers for the Email Generation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::generation::engine::{generate, GeneratedEmail};
use crate::models::company::{CompanyRow, ContactRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateEmailsRequest {
    pub contact_ids: Vec<i64>,
    /// Optional template override applied to every contact in the batch.
    pub template_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedEmailItem {
    pub contact_id: i64,
    pub contact_name: String,
    pub contact_email: String,
    pub company_name: String,
    #[serde(flatten)]
    pub email: GeneratedEmail,
}

#[derive(Debug, Serialize)]
pub struct GenerateEmailsResponse {
    pub emails: Vec<GeneratedEmailItem>,
    pub generated: usize,
    pub failed: usize,
    pub errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewEmailRequest {
    pub contact_id: i64,
    pub template_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewEmailResponse {
    pub contact_id: i64,
    pub contact_name: String,
    pub contact_email: String,
    pub company_name: String,
    pub trigger_type: String,
    #[serde(flatten)]
    pub email: GeneratedEmail,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/emails/generate
///
/// Generates emails for a batch of contacts. Per-item isolation: a missing
/// contact is reported in `errors` and the rest of the batch still renders.
pub async fn handle_generate_emails(
    State(state): State<AppState>,
    Json(request): Json<GenerateEmailsRequest>,
) -> Result<Json<GenerateEmailsResponse>, AppError> {
    if request.contact_ids.is_empty() {
        return Err(AppError::Validation(
            "contact_ids cannot be empty".to_string(),
        ));
    }

    let mut emails = Vec::new();
    let mut errors = Vec::new();

    for contact_id in &request.contact_ids {
        match load_contact_pair(&state, *contact_id).await {
            Ok((contact, company)) => {
                let email = generate(&contact, &company, request.template_type.as_deref());
                emails.push(GeneratedEmailItem {
                    contact_id: contact.id,
                    contact_name: format!("{} {}", contact.first_name, contact.last_name)
                        .trim()
                        .to_string(),
                    contact_email: contact.email.clone(),
                    company_name: company.name.clone(),
                    email,
                });
            }
            Err(e) => {
                errors.push(json!({ "contact_id": contact_id, "error": e.to_string() }));
            }
        }
    }

    Ok(Json(GenerateEmailsResponse {
        generated: emails.len(),
        failed: errors.len(),
        emails,
        errors,
    }))
}

/// POST /api/v1/emails/preview
///
/// Renders a single email without side effects, for inspection in the UI.
pub async fn handle_preview_email(
    State(state): State<AppState>,
    Json(request): Json<PreviewEmailRequest>,
) -> Result<Json<PreviewEmailResponse>, AppError> {
    let (contact, company) = load_contact_pair(&state, request.contact_id).await?;

    let email = generate(&contact, &company, request.template_type.as_deref());

    Ok(Json(PreviewEmailResponse {
        contact_id: contact.id,
        contact_name: format!("{} {}", contact.first_name, contact.last_name)
            .trim()
            .to_string(),
        contact_email: contact.email.clone(),
        company_name: company.name.clone(),
        trigger_type: company.trigger_type.clone(),
        email,
    }))
}

/// Fetches a contact and its company in one pass.
async fn load_contact_pair(
    state: &AppState,
    contact_id: i64,
) -> Result<(ContactRow, CompanyRow), AppError> {
    let contact = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1")
        .bind(contact_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact {contact_id} not found")))?;

    let company = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
        .bind(contact.company_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Company {} not found", contact.company_id))
        })?;

    Ok((contact, company))
}
