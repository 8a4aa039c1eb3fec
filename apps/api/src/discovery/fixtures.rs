//! Fixture lead source — a fixed, deterministic synthetic dataset used when
//! no discovery API credential is configured.
//!
//! This keeps the whole pipeline exercisable without network access (demo
//! and test mode). It is not a production path: `main` logs a warning when
//! it is selected.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::discovery::source::{CompanyCandidate, ContactCandidate, LeadSource, SourceError};
use crate::models::TriggerType;

pub struct FixtureSource;

#[async_trait]
impl LeadSource for FixtureSource {
    async fn search_hiring(
        &self,
        job_title: &str,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError> {
        let details = format!("Currently hiring: {job_title}");
        let mut companies = vec![
            hiring_company("TechCorp Solutions", "techcorp-solutions.com", "Software", 75, &details),
            hiring_company("GrowthStart Inc", "growthstart.io", "SaaS", 25, &details),
            hiring_company("ScaleUp Ventures", "scaleup-ventures.com", "E-commerce", 150, &details),
        ];
        companies.truncate(limit);
        Ok(companies)
    }

    async fn search_funding(
        &self,
        _days_back: i64,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError> {
        let today = Utc::now().date_naive();
        let mut companies = vec![
            CompanyCandidate {
                name: "FundedStartup AI".to_string(),
                domain: "fundedstartup.ai".to_string(),
                industry: Some("Artificial Intelligence".to_string()),
                employee_count: Some(35),
                funding_stage: Some("Series A".to_string()),
                recent_funding_amount: Some(5_000_000.0),
                recent_funding_date: Some(today - Duration::days(15)),
                website_technologies: None,
                trigger_type: TriggerType::Funding,
                trigger_details: "Raised $5M Series A 15 days ago".to_string(),
            },
            CompanyCandidate {
                name: "NextGen Robotics".to_string(),
                domain: "nextgen-robotics.com".to_string(),
                industry: Some("Robotics".to_string()),
                employee_count: Some(60),
                funding_stage: Some("Seed".to_string()),
                recent_funding_amount: Some(2_000_000.0),
                recent_funding_date: Some(today - Duration::days(8)),
                website_technologies: None,
                trigger_type: TriggerType::Funding,
                trigger_details: "Raised $2M Seed round 8 days ago".to_string(),
            },
        ];
        companies.truncate(limit);
        Ok(companies)
    }

    async fn search_technology(
        &self,
        technology: &str,
        limit: usize,
    ) -> Result<Vec<CompanyCandidate>, SourceError> {
        let details = format!("Website uses outdated technology: {technology}");
        let mut companies = vec![
            CompanyCandidate {
                name: "LegacyTech Corp".to_string(),
                domain: "legacytech.com".to_string(),
                industry: Some("Manufacturing".to_string()),
                employee_count: Some(200),
                funding_stage: None,
                recent_funding_amount: None,
                recent_funding_date: None,
                website_technologies: Some(vec![
                    technology.to_string(),
                    "Apache".to_string(),
                    "PHP".to_string(),
                ]),
                trigger_type: TriggerType::OutdatedTech,
                trigger_details: details.clone(),
            },
            CompanyCandidate {
                name: "OldSchool Industries".to_string(),
                domain: "oldschool-industries.net".to_string(),
                industry: Some("Consulting".to_string()),
                employee_count: Some(80),
                funding_stage: None,
                recent_funding_amount: None,
                recent_funding_date: None,
                website_technologies: Some(vec![
                    technology.to_string(),
                    "IIS".to_string(),
                    "ASP.NET".to_string(),
                ]),
                trigger_type: TriggerType::OutdatedTech,
                trigger_details: details,
            },
        ];
        companies.truncate(limit);
        Ok(companies)
    }

    async fn search_people(
        &self,
        domain: &str,
        titles: &[&str],
    ) -> Result<Vec<ContactCandidate>, SourceError> {
        let slug = domain.split('.').next().unwrap_or(domain);
        Ok(vec![
            ContactCandidate {
                first_name: "Sarah".to_string(),
                last_name: "Johnson".to_string(),
                email: format!("sarah.johnson@{domain}"),
                job_title: titles.first().unwrap_or(&"Marketing Director").to_string(),
                linkedin_url: Some(format!("https://linkedin.com/in/sarah-johnson-{slug}")),
            },
            ContactCandidate {
                first_name: "Mike".to_string(),
                last_name: "Chen".to_string(),
                email: format!("mike.chen@{domain}"),
                job_title: titles.get(1).unwrap_or(&"Head of Growth").to_string(),
                linkedin_url: Some(format!("https://linkedin.com/in/mike-chen-{slug}")),
            },
        ])
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn hiring_company(
    name: &str,
    domain: &str,
    industry: &str,
    employee_count: i32,
    details: &str,
) -> CompanyCandidate {
    CompanyCandidate {
        name: name.to_string(),
        domain: domain.to_string(),
        industry: Some(industry.to_string()),
        employee_count: Some(employee_count),
        funding_stage: None,
        recent_funding_amount: None,
        recent_funding_date: None,
        website_technologies: None,
        trigger_type: TriggerType::Hiring,
        trigger_details: details.to_string(),
    }
}
