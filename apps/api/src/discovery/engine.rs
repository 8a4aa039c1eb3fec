//! Discovery engine — turns a trigger into a batch of company candidates by
//! fanning out over a fixed catalog of search terms, with cooperative pacing
//! between outbound calls.
//!
//! The engine never aborts a trigger run: per-term failures are logged and
//! the remaining terms still execute, so callers always get partial results
//! at worst.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::discovery::scoring::target_titles;
use crate::discovery::source::{CompanyCandidate, ContactCandidate, LeadSource, SourceError};
use crate::models::TriggerType;

/// Job titles whose open positions signal active growth investment.
pub const HIRING_SEARCH_TITLES: [&str; 8] = [
    "Marketing Manager",
    "Head of Marketing",
    "VP Marketing",
    "Growth Manager",
    "Digital Marketing Manager",
    "Marketing Director",
    "Head of Growth",
    "VP Growth",
];

/// Technology signatures that mark a website as due for a refresh.
pub const OUTDATED_TECHNOLOGIES: [&str; 4] =
    ["jQuery 1.x", "Flash", "Internet Explorer", "Bootstrap 2"];

/// Only the first few catalog terms are searched per run, to keep within
/// third-party quota.
const HIRING_TERMS_PER_RUN: usize = 3;
const TECH_TERMS_PER_RUN: usize = 2;
const FUNDING_DAYS_BACK: i64 = 30;

/// Searches the source for companies matching `trigger`, truncated to
/// `limit`. `pacing` is slept between consecutive per-term queries.
pub async fn find_candidates(
    source: &dyn LeadSource,
    trigger: TriggerType,
    limit: usize,
    pacing: Duration,
) -> Vec<CompanyCandidate> {
    match trigger {
        TriggerType::Hiring => {
            let terms = &HIRING_SEARCH_TITLES[..HIRING_TERMS_PER_RUN];
            let per_term = limit / HIRING_SEARCH_TITLES.len();
            search_terms(source, TermQuery::Hiring, terms, per_term, limit, pacing).await
        }
        TriggerType::Funding => match source.search_funding(FUNDING_DAYS_BACK, limit).await {
            Ok(mut companies) => {
                companies.truncate(limit);
                companies
            }
            Err(SourceError::RateLimited { retry_after }) => {
                warn!("Funding search rate limited; backing off {retry_after:?} and skipping");
                tokio::time::sleep(retry_after).await;
                vec![]
            }
            Err(e) => {
                error!("Funding search failed: {e}");
                vec![]
            }
        },
        TriggerType::OutdatedTech => {
            let terms = &OUTDATED_TECHNOLOGIES[..TECH_TERMS_PER_RUN];
            let per_term = limit / OUTDATED_TECHNOLOGIES.len();
            search_terms(source, TermQuery::Technology, terms, per_term, limit, pacing).await
        }
        TriggerType::General => {
            warn!("'general' is not a discoverable trigger; returning no candidates");
            vec![]
        }
    }
}

/// Which per-term query a catalog maps onto.
enum TermQuery {
    Hiring,
    Technology,
}

/// One query per term with pacing in between. A rate-limit signal triggers a
/// single wait for the indicated duration and the term is skipped — no
/// retries. Any other error logs and moves on.
async fn search_terms(
    source: &dyn LeadSource,
    query: TermQuery,
    terms: &[&str],
    per_term: usize,
    limit: usize,
    pacing: Duration,
) -> Vec<CompanyCandidate> {
    let mut companies = Vec::new();

    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(pacing).await;
        }

        let result = match query {
            TermQuery::Hiring => source.search_hiring(term, per_term).await,
            TermQuery::Technology => source.search_technology(term, per_term).await,
        };

        match result {
            Ok(batch) => {
                info!(
                    "{} search for '{term}' returned {} companies",
                    source.name(),
                    batch.len()
                );
                companies.extend(batch);
            }
            Err(SourceError::RateLimited { retry_after }) => {
                warn!("Search for '{term}' rate limited; backing off {retry_after:?} and skipping");
                tokio::time::sleep(retry_after).await;
            }
            Err(e) => {
                error!("Search for '{term}' failed: {e}");
            }
        }
    }

    companies.truncate(limit);
    companies
}

/// Finds likely decision-makers at a company, targeting titles appropriate
/// for its headcount tier. Failures yield an empty list, never an abort.
pub async fn find_decision_makers(
    source: &dyn LeadSource,
    domain: &str,
    employee_count: i32,
) -> Vec<ContactCandidate> {
    let titles = target_titles(employee_count);

    match source.search_people(domain, titles).await {
        Ok(contacts) => contacts,
        Err(e) => {
            error!("People search for {domain} failed: {e}");
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::fixtures::FixtureSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source whose hiring search fails on one specific term.
    struct FlakySource {
        failing_term: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LeadSource for FlakySource {
        async fn search_hiring(
            &self,
            job_title: &str,
            limit: usize,
        ) -> Result<Vec<CompanyCandidate>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if job_title == self.failing_term {
                return Err(SourceError::Payload("boom".to_string()));
            }
            FixtureSource.search_hiring(job_title, limit).await
        }

        async fn search_funding(
            &self,
            _days_back: i64,
            _limit: usize,
        ) -> Result<Vec<CompanyCandidate>, SourceError> {
            Err(SourceError::Payload("unused".to_string()))
        }

        async fn search_technology(
            &self,
            _technology: &str,
            _limit: usize,
        ) -> Result<Vec<CompanyCandidate>, SourceError> {
            Err(SourceError::Payload("unused".to_string()))
        }

        async fn search_people(
            &self,
            _domain: &str,
            _titles: &[&str],
        ) -> Result<Vec<ContactCandidate>, SourceError> {
            Err(SourceError::Payload("unused".to_string()))
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_hiring_run_aggregates_across_terms() {
        let source = FixtureSource;
        let companies =
            find_candidates(&source, TriggerType::Hiring, 50, Duration::ZERO).await;
        // 3 terms x up to (50 / 8) = 6 per term, fixture returns 3 each.
        assert_eq!(companies.len(), 9);
        assert!(companies.iter().all(|c| c.trigger_type == TriggerType::Hiring));
    }

    #[tokio::test]
    async fn test_hiring_run_truncates_to_limit() {
        let source = FixtureSource;
        let companies =
            find_candidates(&source, TriggerType::Hiring, 4, Duration::ZERO).await;
        assert!(companies.len() <= 4);
    }

    #[tokio::test]
    async fn test_per_term_failure_does_not_abort_run() {
        let source = FlakySource {
            failing_term: "Head of Marketing",
            calls: AtomicUsize::new(0),
        };
        let companies =
            find_candidates(&source, TriggerType::Hiring, 50, Duration::ZERO).await;

        // All three terms were attempted despite the middle one failing.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        // Two terms' worth of fixture companies survive.
        assert_eq!(companies.len(), 6);
    }

    #[tokio::test]
    async fn test_funding_is_single_query() {
        let source = FixtureSource;
        let companies =
            find_candidates(&source, TriggerType::Funding, 50, Duration::ZERO).await;
        assert_eq!(companies.len(), 2);
    }

    #[tokio::test]
    async fn test_outdated_tech_uses_first_two_catalog_terms() {
        let source = FixtureSource;
        let companies =
            find_candidates(&source, TriggerType::OutdatedTech, 50, Duration::ZERO).await;
        // 2 terms x 2 fixture companies each.
        assert_eq!(companies.len(), 4);
        assert!(companies
            .iter()
            .any(|c| c.trigger_details.contains("jQuery 1.x")));
        assert!(companies.iter().any(|c| c.trigger_details.contains("Flash")));
        assert!(!companies
            .iter()
            .any(|c| c.trigger_details.contains("Bootstrap 2")));
    }

    #[tokio::test]
    async fn test_general_trigger_discovers_nothing() {
        let source = FixtureSource;
        let companies =
            find_candidates(&source, TriggerType::General, 50, Duration::ZERO).await;
        assert!(companies.is_empty());
    }

    #[tokio::test]
    async fn test_decision_makers_follow_size_tier() {
        let source = FixtureSource;
        let contacts = find_decision_makers(&source, "growthstart.io", 25).await;
        // Small tier targets founder titles first.
        assert_eq!(contacts[0].job_title, "Founder");
    }

    #[tokio::test]
    async fn test_decision_makers_failure_yields_empty() {
        let source = FlakySource {
            failing_term: "",
            calls: AtomicUsize::new(0),
        };
        let contacts = find_decision_makers(&source, "acme.com", 25).await;
        assert!(contacts.is_empty());
    }
}
