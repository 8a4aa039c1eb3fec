//! Axum route handlers for the Lead Discovery API.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;
use tracing::{error, info};

use crate::discovery::engine::{find_candidates, find_decision_makers};
use crate::discovery::scoring::decision_maker_score;
use crate::discovery::source::CompanyCandidate;
use crate::errors::AppError;
use crate::models::company::{CompanyRow, ContactRow};
use crate::models::TriggerType;
use crate::state::AppState;

const DEFAULT_DISCOVER_LIMIT: usize = 50;
const DEFAULT_LIST_LIMIT: i64 = 50;
const TOP_CONTACTS_PER_COMPANY: i64 = 3;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub trigger_type: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub trigger_type: String,
    pub candidates_found: usize,
    pub companies_saved: usize,
    pub contacts_saved: usize,
    pub skipped_existing: usize,
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListCompaniesQuery {
    pub trigger_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CompanyWithContacts {
    #[serde(flatten)]
    pub company: CompanyRow,
    pub contact_count: i64,
    /// Highest-scoring contacts, best first.
    pub top_contacts: Vec<ContactRow>,
}

#[derive(Debug, Serialize)]
pub struct ListCompaniesResponse {
    pub companies: Vec<CompanyWithContacts>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct CompanyContactsResponse {
    pub company_id: i64,
    pub contacts: Vec<ContactRow>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_companies: i64,
    pub total_contacts: i64,
    pub companies_by_trigger: BTreeMap<String, i64>,
    pub validated_contacts: i64,
    pub contacted_contacts: i64,
    pub responses_received: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/leads/discover
///
/// Runs a discovery pass for one trigger and persists the new companies
/// with their scored decision-makers. Already-known domains are skipped;
/// a failure while persisting one company rolls back that company only.
pub async fn handle_discover(
    State(state): State<AppState>,
    Json(request): Json<DiscoverRequest>,
) -> Result<Json<DiscoverResponse>, AppError> {
    let trigger = TriggerType::parse(&request.trigger_type).ok_or_else(|| {
        AppError::Validation(format!("Unknown trigger_type '{}'", request.trigger_type))
    })?;
    if !TriggerType::DISCOVERABLE.contains(&trigger) {
        return Err(AppError::Validation(format!(
            "trigger_type '{}' is not discoverable",
            trigger.as_str()
        )));
    }

    let limit = request.limit.unwrap_or(DEFAULT_DISCOVER_LIMIT);
    let pacing = Duration::from_millis(state.config.scoring.discovery_delay_ms);

    info!(
        "Discovery run: trigger={} limit={limit} source={}",
        trigger.as_str(),
        state.source.name()
    );

    let candidates = find_candidates(state.source.as_ref(), trigger, limit, pacing).await;

    let mut companies_saved = 0;
    let mut contacts_saved = 0;
    let mut skipped_existing = 0;
    let mut failed = 0;

    for candidate in &candidates {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE domain = $1)",
        )
        .bind(&candidate.domain)
        .fetch_one(&state.db)
        .await?;
        if exists {
            skipped_existing += 1;
            continue;
        }

        match persist_company(&state, candidate).await {
            Ok(saved_contacts) => {
                companies_saved += 1;
                contacts_saved += saved_contacts;
            }
            Err(e) => {
                error!("Failed to persist company {}: {e}", candidate.domain);
                failed += 1;
            }
        }
    }

    Ok(Json(DiscoverResponse {
        trigger_type: trigger.as_str().to_string(),
        candidates_found: candidates.len(),
        companies_saved,
        contacts_saved,
        skipped_existing,
        failed,
    }))
}

/// GET /api/v1/leads/companies
///
/// Paginated company list with contact counts and the top few contacts
/// per company, optionally filtered by trigger.
pub async fn handle_list_companies(
    State(state): State<AppState>,
    Query(query): Query<ListCompaniesQuery>,
) -> Result<Json<ListCompaniesResponse>, AppError> {
    if let Some(trigger) = query.trigger_type.as_deref() {
        if TriggerType::parse(trigger).is_none() {
            return Err(AppError::Validation(format!(
                "Unknown trigger_type '{trigger}'"
            )));
        }
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let companies = sqlx::query_as::<_, CompanyRow>(
        "SELECT * FROM companies
         WHERE ($1::text IS NULL OR trigger_type = $1)
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(&query.trigger_type)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM companies WHERE ($1::text IS NULL OR trigger_type = $1)",
    )
    .bind(&query.trigger_type)
    .fetch_one(&state.db)
    .await?;

    let mut enriched = Vec::with_capacity(companies.len());
    for company in companies {
        let contact_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contacts WHERE company_id = $1",
        )
        .bind(company.id)
        .fetch_one(&state.db)
        .await?;

        let top_contacts = sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contacts WHERE company_id = $1
             ORDER BY decision_maker_score DESC
             LIMIT $2",
        )
        .bind(company.id)
        .bind(TOP_CONTACTS_PER_COMPANY)
        .fetch_all(&state.db)
        .await?;

        enriched.push(CompanyWithContacts {
            company,
            contact_count,
            top_contacts,
        });
    }

    Ok(Json(ListCompaniesResponse {
        companies: enriched,
        total,
        limit,
        offset,
    }))
}

/// GET /api/v1/leads/companies/:id/contacts
///
/// All contacts for a company, best decision-makers first.
pub async fn handle_company_contacts(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
) -> Result<Json<CompanyContactsResponse>, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM companies WHERE id = $1)",
    )
    .bind(company_id)
    .fetch_one(&state.db)
    .await?;
    if !exists {
        return Err(AppError::NotFound(format!(
            "Company {company_id} not found"
        )));
    }

    let contacts = sqlx::query_as::<_, ContactRow>(
        "SELECT * FROM contacts WHERE company_id = $1
         ORDER BY decision_maker_score DESC",
    )
    .bind(company_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CompanyContactsResponse {
        company_id,
        contacts,
    }))
}

/// GET /api/v1/leads/stats
///
/// Pipeline totals: companies per trigger plus contact funnel counts.
pub async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let total_companies =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies")
            .fetch_one(&state.db)
            .await?;
    let total_contacts = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts")
        .fetch_one(&state.db)
        .await?;

    let trigger_rows = sqlx::query(
        "SELECT trigger_type, COUNT(*) AS count FROM companies GROUP BY trigger_type",
    )
    .fetch_all(&state.db)
    .await?;
    let mut companies_by_trigger = BTreeMap::new();
    for row in &trigger_rows {
        companies_by_trigger.insert(row.get::<String, _>("trigger_type"), row.get::<i64, _>("count"));
    }

    let funnel = sqlx::query(
        "SELECT
             COUNT(*) FILTER (WHERE email_validated) AS validated,
             COUNT(*) FILTER (WHERE contacted) AS contacted,
             COUNT(*) FILTER (WHERE response_received) AS responses
         FROM contacts",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(StatsResponse {
        total_companies,
        total_contacts,
        companies_by_trigger,
        validated_contacts: funnel.get::<i64, _>("validated"),
        contacted_contacts: funnel.get::<i64, _>("contacted"),
        responses_received: funnel.get::<i64, _>("responses"),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Internals
// ────────────────────────────────────────────────────────────────────────────

/// Inserts one company and its scored contacts in a single transaction.
/// Returns the number of contacts saved.
async fn persist_company(
    state: &AppState,
    candidate: &CompanyCandidate,
) -> Result<usize, AppError> {
    let employee_count = candidate.employee_count.unwrap_or(50);
    let contacts = find_decision_makers(
        state.source.as_ref(),
        &candidate.domain,
        employee_count,
    )
    .await;

    let now = Utc::now();
    let mut tx = state.db.begin().await?;

    let company_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO companies
             (name, domain, industry, employee_count, funding_stage,
              recent_funding_amount, recent_funding_date, website_technologies,
              trigger_type, trigger_details, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
         RETURNING id",
    )
    .bind(&candidate.name)
    .bind(&candidate.domain)
    .bind(&candidate.industry)
    .bind(candidate.employee_count)
    .bind(&candidate.funding_stage)
    .bind(candidate.recent_funding_amount)
    .bind(candidate.recent_funding_date)
    .bind(candidate.website_technologies.as_ref().map(|t| json!(t)))
    .bind(candidate.trigger_type.as_str())
    .bind(&candidate.trigger_details)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let mut saved = 0;
    for contact in &contacts {
        let score = decision_maker_score(&contact.job_title, employee_count);
        sqlx::query(
            "INSERT INTO contacts
                 (company_id, first_name, last_name, email, job_title,
                  linkedin_url, decision_maker_score, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(company_id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.job_title)
        .bind(&contact.linkedin_url)
        .bind(score)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        saved += 1;
    }

    tx.commit().await?;
    Ok(saved)
}
