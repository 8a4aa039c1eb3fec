//! Lead Source — pluggable, trait-based access to the external company and
//! people data used by discovery.
//!
//! Default when credentials are configured: `ApolloSource` (live HTTPS).
//! Fallback: `FixtureSource` (fixed synthetic dataset — demo/test mode).
//!
//! `AppState` holds an `Arc<dyn LeadSource>`, selected once at startup.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TriggerType;

/// A company returned by a trigger search, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyCandidate {
    pub name: String,
    pub domain: String,
    pub industry: Option<String>,
    pub employee_count: Option<i32>,
    pub funding_stage: Option<String>,
    pub recent_funding_amount: Option<f64>,
    pub recent_funding_date: Option<NaiveDate>,
    pub website_technologies: Option<Vec<String>>,
    pub trigger_type: TriggerType,
    pub trigger_details: String,
}

/// A person returned by a people search, before scoring and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: String,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source signalled an explicit rate limit. The engine waits this
    /// long once and skips the term — it never retries in a loop.
    #[error("rate limited by source, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed payload: {0}")]
    Payload(String),
}

/// The lead source trait. Implement this to swap the external data backend
/// without touching the engine, handlers, or scoring.
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Companies with an open position matching `job_title`.
    async fn search_hiring(
        &self,
        job_title: &str,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError>;

    /// Companies that announced funding within the last `days_back` days.
    async fn search_funding(
        &self,
        days_back: i64,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError>;

    /// Companies whose website carries the given technology signature.
    async fn search_technology(
        &self,
        technology: &str,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError>;

    /// People at `domain` holding one of `titles`.
    async fn search_people(
        &self,
        domain: &str,
        titles: &[&str],
    ) -> Result<Vec<ContactCandidate>, SourceError>;

    /// Label for logs ("apollo" | "fixture").
    fn name(&self) -> &'static str;
}
