use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A discovered company. Identity key is `domain` (unique) — the same
/// company found through a second trigger is skipped, not duplicated.
/// Rows are immutable after discovery apart from `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRow {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub industry: Option<String>,
    pub employee_count: Option<i32>,
    pub funding_stage: Option<String>,
    pub recent_funding_amount: Option<f64>,
    pub recent_funding_date: Option<NaiveDate>,
    /// JSON array of technology names reported by the technology source.
    pub website_technologies: Option<Value>,
    pub trigger_type: String,
    pub trigger_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person at a discovered company. `decision_maker_score` is recomputed
/// by the scoring ladder; `email_validated`/`email_validation_result` are
/// written by the validation engine; `contacted`/`contact_date` by delivery.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub linkedin_url: Option<String>,
    pub decision_maker_score: f64,
    pub email_validated: bool,
    pub email_validation_result: Option<String>,
    pub contacted: bool,
    pub contact_date: Option<DateTime<Utc>>,
    pub response_received: bool,
    pub response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
