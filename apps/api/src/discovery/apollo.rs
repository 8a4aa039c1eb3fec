//! Live lead source backed by the Apollo people/company search API, with
//! BuiltWith for technology-signature lookups.
//!
//! All discovery HTTP traffic goes through this module. Responses are
//! deserialized into narrow typed structs and mapped to candidates; a 429
//! is surfaced as `SourceError::RateLimited` with the server-indicated
//! retry delay so the engine can wait once and move on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::discovery::source::{CompanyCandidate, ContactCandidate, LeadSource, SourceError};
use crate::models::TriggerType;

const APOLLO_BASE_URL: &str = "https://api.apollo.io/v1";
const BUILTWITH_BASE_URL: &str = "https://api.builtwith.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Wait applied when a 429 arrives without a usable Retry-After header.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);

pub struct ApolloSource {
    http: Client,
    apollo_api_key: String,
    builtwith_api_key: Option<String>,
}

impl ApolloSource {
    pub fn new(apollo_api_key: String, builtwith_api_key: Option<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            apollo_api_key,
            builtwith_api_key,
        }
    }

    async fn post_apollo<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SourceError> {
        let response = self
            .http
            .post(format!("{APOLLO_BASE_URL}{path}"))
            .header("X-Api-Key", &self.apollo_api_key)
            .json(body)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Maps a non-success response to the source error taxonomy, pulling the
/// retry delay out of Retry-After on a 429.
async fn check_status(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_BACKOFF);
        return Err(SourceError::RateLimited { retry_after });
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(SourceError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OrgSearchRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    q_organization_job_titles: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_funding_date_range_days: Option<i64>,
    per_page: usize,
}

#[derive(Debug, Deserialize)]
struct OrgSearchResponse {
    #[serde(default)]
    organizations: Vec<ApolloOrganization>,
}

#[derive(Debug, Deserialize)]
struct ApolloOrganization {
    name: String,
    primary_domain: Option<String>,
    industry: Option<String>,
    estimated_num_employees: Option<i32>,
    latest_funding_stage: Option<String>,
    latest_funding_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PeopleSearchRequest<'a> {
    q_organization_domains: &'a str,
    person_titles: &'a [&'a str],
    per_page: usize,
}

#[derive(Debug, Deserialize)]
struct PeopleSearchResponse {
    #[serde(default)]
    people: Vec<ApolloPerson>,
}

#[derive(Debug, Deserialize)]
struct ApolloPerson {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    title: Option<String>,
    linkedin_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BuiltWithResponse {
    #[serde(default, rename = "Results")]
    results: Vec<BuiltWithResult>,
}

#[derive(Debug, Deserialize)]
struct BuiltWithResult {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "CompanyName")]
    company_name: Option<String>,
    #[serde(default, rename = "Technologies")]
    technologies: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// LeadSource implementation
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl LeadSource for ApolloSource {
    async fn search_hiring(
        &self,
        job_title: &str,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError> {
        let request = OrgSearchRequest {
            q_organization_job_titles: Some(vec![job_title]),
            latest_funding_date_range_days: None,
            per_page: limit,
        };
        let response: OrgSearchResponse = self
            .post_apollo("/mixed_companies/search", &request)
            .await?;

        Ok(response
            .organizations
            .into_iter()
            .filter_map(|org| {
                org_to_candidate(
                    org,
                    TriggerType::Hiring,
                    &format!("Currently hiring: {job_title}"),
                )
            })
            .take(limit)
            .collect())
    }

    async fn search_funding(
        &self,
        days_back: i64,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError> {
        let request = OrgSearchRequest {
            q_organization_job_titles: None,
            latest_funding_date_range_days: Some(days_back),
            per_page: limit,
        };
        let response: OrgSearchResponse = self
            .post_apollo("/mixed_companies/search", &request)
            .await?;

        Ok(response
            .organizations
            .into_iter()
            .filter_map(|org| {
                let stage = org.latest_funding_stage.clone().unwrap_or_default();
                org_to_candidate(
                    org,
                    TriggerType::Funding,
                    &format!("Recently raised a {stage} round"),
                )
            })
            .take(limit)
            .collect())
    }

    async fn search_technology(
        &self,
        technology: &str,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError> {
        let Some(key) = &self.builtwith_api_key else {
            warn!("No BuiltWith key configured; skipping technology search for {technology}");
            return Ok(vec![]);
        };

        let response = self
            .http
            .get(format!("{BUILTWITH_BASE_URL}/lists/api.json"))
            .query(&[("KEY", key.as_str()), ("TECH", technology)])
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: BuiltWithResponse = response.json().await?;

        Ok(body
            .results
            .into_iter()
            .map(|result| CompanyCandidate {
                name: result.company_name.unwrap_or_else(|| result.domain.clone()),
                domain: result.domain,
                industry: None,
                employee_count: None,
                funding_stage: None,
                recent_funding_amount: None,
                recent_funding_date: None,
                website_technologies: Some(if result.technologies.is_empty() {
                    vec![technology.to_string()]
                } else {
                    result.technologies
                }),
                trigger_type: TriggerType::OutdatedTech,
                trigger_details: format!("Website uses outdated technology: {technology}"),
            })
            .take(limit)
            .collect())
    }

    async fn search_people(
        &self,
        domain: &str,
        titles: &[&str],
    ) -> Result<Vec<ContactCandidate>, SourceError> {
        let request = PeopleSearchRequest {
            q_organization_domains: domain,
            person_titles: titles,
            per_page: 10,
        };
        let response: PeopleSearchResponse =
            self.post_apollo("/mixed_people/search", &request).await?;

        Ok(response
            .people
            .into_iter()
            .filter_map(|person| {
                // People without a resolvable email are useless downstream.
                let email = person.email?;
                Some(ContactCandidate {
                    first_name: person.first_name.unwrap_or_default(),
                    last_name: person.last_name.unwrap_or_default(),
                    email,
                    job_title: person.title.unwrap_or_default(),
                    linkedin_url: person.linkedin_url,
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "apollo"
    }
}

fn org_to_candidate(
    org: ApolloOrganization,
    trigger_type: TriggerType,
    trigger_details: &str,
) -> Option<CompanyCandidate> {
    // Domain is the identity key; organizations without one cannot be stored.
    let domain = org.primary_domain?;
    Some(CompanyCandidate {
        name: org.name,
        domain,
        industry: org.industry,
        employee_count: org.estimated_num_employees,
        funding_stage: org.latest_funding_stage,
        recent_funding_amount: org.latest_funding_amount,
        recent_funding_date: None,
        website_technologies: None,
        trigger_type,
        trigger_details: trigger_details.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_without_domain_is_dropped() {
        let org = ApolloOrganization {
            name: "No Domain Inc".to_string(),
            primary_domain: None,
            industry: None,
            estimated_num_employees: Some(10),
            latest_funding_stage: None,
            latest_funding_amount: None,
        };
        assert!(org_to_candidate(org, TriggerType::Hiring, "x").is_none());
    }

    #[test]
    fn test_org_maps_to_candidate() {
        let org = ApolloOrganization {
            name: "Acme".to_string(),
            primary_domain: Some("acme.com".to_string()),
            industry: Some("Software".to_string()),
            estimated_num_employees: Some(40),
            latest_funding_stage: Some("Seed".to_string()),
            latest_funding_amount: Some(1_500_000.0),
        };
        let candidate =
            org_to_candidate(org, TriggerType::Funding, "Recently raised a Seed round").unwrap();
        assert_eq!(candidate.domain, "acme.com");
        assert_eq!(candidate.trigger_type, TriggerType::Funding);
        assert_eq!(candidate.recent_funding_amount, Some(1_500_000.0));
    }

    #[test]
    fn test_people_response_tolerates_missing_fields() {
        let json = r#"{
            "people": [
                {"first_name": "Ada", "last_name": "Lovelace", "email": "ada@acme.com", "title": "CEO"},
                {"first_name": "No", "last_name": "Email", "title": "CTO"}
            ]
        }"#;
        let parsed: PeopleSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.people.len(), 2);
        assert!(parsed.people[1].email.is_none());
    }

    #[test]
    fn test_builtwith_response_shape() {
        let json = r#"{
            "Results": [
                {"Domain": "legacy.com", "CompanyName": "Legacy", "Technologies": ["Flash", "PHP"]}
            ]
        }"#;
        let parsed: BuiltWithResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].domain, "legacy.com");
        assert_eq!(parsed.results[0].technologies.len(), 2);
    }
}
