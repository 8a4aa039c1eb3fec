//! Axum route handlers for campaign CRUD and the template catalog.
//!
//! Campaigns are bookkeeping records; nothing in the engines reads them.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::templates::TEMPLATE_CATALOG;
use crate::models::campaign::{CampaignRow, CampaignStatus};
use crate::models::TriggerType;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub trigger_type: String,
    pub email_template: String,
    pub subject_template: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub email_template: Option<String>,
    pub subject_template: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CampaignListResponse {
    pub campaigns: Vec<CampaignRow>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct TemplateEntry {
    pub trigger_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub subject_template: &'static str,
    pub email_template: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<TemplateEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/campaigns
///
/// Creates a campaign in `draft` status.
pub async fn handle_create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<Json<CampaignRow>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if TriggerType::parse(&request.trigger_type).is_none() {
        return Err(AppError::Validation(format!(
            "Unknown trigger_type '{}'",
            request.trigger_type
        )));
    }

    let now = Utc::now();
    let campaign = sqlx::query_as::<_, CampaignRow>(
        "INSERT INTO email_campaigns
             (name, trigger_type, email_template, subject_template, status,
              emails_sent, responses_received, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, 0, 0, $6, $6)
         RETURNING *",
    )
    .bind(request.name.trim())
    .bind(&request.trigger_type)
    .bind(&request.email_template)
    .bind(&request.subject_template)
    .bind(CampaignStatus::Draft.as_str())
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(campaign))
}

/// GET /api/v1/campaigns
pub async fn handle_list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<CampaignListResponse>, AppError> {
    let campaigns = sqlx::query_as::<_, CampaignRow>(
        "SELECT * FROM email_campaigns ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CampaignListResponse {
        total: campaigns.len(),
        campaigns,
    }))
}

/// PUT /api/v1/campaigns/:id
///
/// Partial update; absent fields are left untouched. Status transitions are
/// unrestricted but the vocabulary is validated.
pub async fn handle_update_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<i64>,
    Json(request): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignRow>, AppError> {
    if let Some(status) = request.status.as_deref() {
        if CampaignStatus::parse(status).is_none() {
            return Err(AppError::Validation(format!("Unknown status '{status}'")));
        }
    }
    if let Some(name) = request.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
    }

    let existing = sqlx::query_as::<_, CampaignRow>(
        "SELECT * FROM email_campaigns WHERE id = $1",
    )
    .bind(campaign_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Campaign {campaign_id} not found")))?;

    let campaign = sqlx::query_as::<_, CampaignRow>(
        "UPDATE email_campaigns
         SET name = $1, status = $2, email_template = $3, subject_template = $4,
             updated_at = $5
         WHERE id = $6
         RETURNING *",
    )
    .bind(request.name.map(|n| n.trim().to_string()).unwrap_or(existing.name))
    .bind(request.status.unwrap_or(existing.status))
    .bind(request.email_template.unwrap_or(existing.email_template))
    .bind(request.subject_template.unwrap_or(existing.subject_template))
    .bind(Utc::now())
    .bind(campaign_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(campaign))
}

/// GET /api/v1/campaigns/templates
///
/// Lists the built-in template catalog so the UI can seed new campaigns.
pub async fn handle_list_templates() -> Json<TemplatesResponse> {
    let templates = TEMPLATE_CATALOG
        .iter()
        .map(|info| {
            let (subject, body) = crate::generation::templates::templates_for(info.trigger);
            TemplateEntry {
                trigger_type: info.trigger.as_str(),
                name: info.name,
                description: info.description,
                subject_template: subject,
                email_template: body,
            }
        })
        .collect();

    Json(TemplatesResponse { templates })
}
