//! Layered email validation: shape → domain → mailbox probe → provider.
//!
//! The layers short-circuit on hard failures (bad shape, unresolvable
//! domain) and degrade on soft ones (probe inconclusive, provider down).
//! `validate` never returns an error; an internal failure yields an
//! `error` verdict with the cause recorded in the details map.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::{Config, ScoringConfig};
use crate::validation::checks::{check_domain, is_valid_format, probe_mailbox, MailboxProbe};
use crate::validation::provider::{hunter_check, zerobounce_check};

/// Final validation result for one address. Transient; only the verdict is
/// persisted, onto the contact.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub email: String,
    pub is_valid: bool,
    pub confidence_score: f64,
    /// `valid | invalid | risky | unknown | error | invalid_format | invalid_domain`
    pub verdict: String,
    pub details: BTreeMap<String, Value>,
}

impl ValidationReport {
    fn terminal(email: &str, verdict: &str, details: BTreeMap<String, Value>) -> Self {
        Self {
            email: email.to_string(),
            is_valid: false,
            confidence_score: 0.0,
            verdict: verdict.to_string(),
            details,
        }
    }
}

pub struct EmailValidator {
    http: reqwest::Client,
    zerobounce_api_key: Option<String>,
    hunter_api_key: Option<String>,
    scoring: ScoringConfig,
    /// Sender address used for the MAIL FROM line of the mailbox probe.
    probe_from: String,
}

impl EmailValidator {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            zerobounce_api_key: config.zerobounce_api_key.clone(),
            hunter_api_key: config.hunter_api_key.clone(),
            scoring: config.scoring.clone(),
            probe_from: config.smtp.from_email.clone(),
        }
    }

    /// Runs all layers against one address.
    pub async fn validate(&self, email: &str) -> ValidationReport {
        let email = email.trim();
        let mut details = BTreeMap::new();

        // Layer 1: shape.
        let format_ok = is_valid_format(email);
        details.insert("format_check".to_string(), json!(format_ok));
        if !format_ok {
            return ValidationReport::terminal(email, "invalid_format", details);
        }

        // Shape check guarantees exactly the local@domain split exists.
        let domain = match email.split_once('@') {
            Some((_, domain)) => domain,
            None => return ValidationReport::terminal(email, "invalid_format", details),
        };

        // Layer 2: domain resolution.
        let domain_check = match check_domain(domain).await {
            Ok(check) => check,
            Err(e) => {
                warn!("Domain check for {domain} errored: {e}");
                details.insert("error".to_string(), json!(e.to_string()));
                return ValidationReport::terminal(email, "error", details);
            }
        };
        details.insert("domain_check".to_string(), json!(domain_check.resolvable));
        if !domain_check.resolvable {
            return ValidationReport::terminal(email, "invalid_domain", details);
        }

        // Layer 3: mailbox probe, only when the domain publishes MX records.
        let probe = match domain_check.primary_mx.as_deref() {
            Some(mx_host) => {
                let probe = probe_mailbox(mx_host, email, &self.probe_from).await;
                details.insert(
                    "mailbox_probe".to_string(),
                    json!({
                        "mx_host": mx_host,
                        "deliverable": probe.deliverable,
                        "conclusive": probe.conclusive,
                        "detail": probe.detail,
                    }),
                );
                Some(probe)
            }
            None => {
                details.insert("mailbox_probe".to_string(), json!("skipped: no MX records"));
                None
            }
        };

        // Layer 4: provider verdict, or self-computed weighted confidence.
        if let Some(provider) = self.provider_check(email, &mut details).await {
            let is_valid = provider.verdict == "valid";
            return ValidationReport {
                email: email.to_string(),
                is_valid,
                confidence_score: provider.confidence,
                verdict: provider.verdict.to_string(),
                details,
            };
        }

        let confidence = weighted_confidence(&self.scoring, probe.as_ref());

        let verdict = if confidence >= self.scoring.valid_confidence_threshold {
            "valid"
        } else {
            "risky"
        };

        ValidationReport {
            email: email.to_string(),
            is_valid: verdict == "valid",
            confidence_score: confidence,
            verdict: verdict.to_string(),
            details,
        }
    }

    /// Consults ZeroBounce, then Hunter, whichever is keyed. A provider
    /// failure is recorded and validation falls through to the
    /// self-computed confidence.
    async fn provider_check(
        &self,
        email: &str,
        details: &mut BTreeMap<String, Value>,
    ) -> Option<crate::validation::provider::ProviderVerdict> {
        let result = if let Some(key) = self.zerobounce_api_key.as_deref() {
            zerobounce_check(&self.http, key, email).await
        } else if let Some(key) = self.hunter_api_key.as_deref() {
            hunter_check(&self.http, key, email).await
        } else {
            return None;
        };

        match result {
            Ok(verdict) => {
                details.insert(
                    "provider_check".to_string(),
                    json!({
                        "provider": verdict.provider,
                        "status": verdict.raw_status,
                        "verdict": verdict.verdict,
                    }),
                );
                Some(verdict)
            }
            Err(e) => {
                warn!("Provider check for {email} failed: {e}");
                details.insert(
                    "provider_check".to_string(),
                    json!({ "error": e.to_string() }),
                );
                None
            }
        }
    }
}

/// Self-computed confidence when no provider is keyed: a passed format and
/// domain layer each contribute their full weight, the mailbox weight only
/// when the probe positively confirmed deliverability. An inconclusive or
/// skipped probe adds nothing, so format + domain alone land exactly on the
/// validity threshold.
fn weighted_confidence(scoring: &ScoringConfig, probe: Option<&MailboxProbe>) -> f64 {
    let deliverable = matches!(probe, Some(p) if p.deliverable);
    let factor = if deliverable { 1.0 } else { 0.0 };
    (scoring.format_weight + scoring.domain_weight + scoring.mailbox_weight * factor)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> EmailValidator {
        EmailValidator {
            http: reqwest::Client::new(),
            zerobounce_api_key: None,
            hunter_api_key: None,
            scoring: ScoringConfig::default(),
            probe_from: "outreach@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_malformed_address_short_circuits() {
        let report = validator().validate("not-an-email").await;
        assert_eq!(report.verdict, "invalid_format");
        assert!(!report.is_valid);
        assert!((report.confidence_score - 0.0).abs() < f64::EPSILON);
        assert_eq!(report.details["format_check"], json!(false));
        // Layers after the failing one never ran.
        assert!(!report.details.contains_key("domain_check"));
    }

    #[tokio::test]
    async fn test_unresolvable_domain_short_circuits() {
        // Reserved TLD guaranteed never to resolve (RFC 2606).
        let report = validator()
            .validate("someone@definitely-not-real.invalid")
            .await;
        assert!(matches!(report.verdict.as_str(), "invalid_domain" | "error"));
        assert!(!report.is_valid);
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let report = validator().validate("  not-an-email  ").await;
        assert_eq!(report.email, "not-an-email");
        assert_eq!(report.verdict, "invalid_format");
    }

    #[test]
    fn test_inconclusive_probe_contributes_nothing() {
        let scoring = ScoringConfig::default();
        let probe = MailboxProbe {
            deliverable: false,
            conclusive: false,
            detail: "RCPT replied 451: greylisted".to_string(),
        };
        let confidence = weighted_confidence(&scoring, Some(&probe));
        assert!((confidence - (scoring.format_weight + scoring.domain_weight)).abs() < 1e-9);
        // Format + domain alone still clear the validity bar.
        assert!(confidence >= scoring.valid_confidence_threshold);
    }

    #[test]
    fn test_skipped_probe_matches_inconclusive() {
        let scoring = ScoringConfig::default();
        let skipped = weighted_confidence(&scoring, None);
        let inconclusive = weighted_confidence(
            &scoring,
            Some(&MailboxProbe {
                deliverable: false,
                conclusive: false,
                detail: "probe timed out".to_string(),
            }),
        );
        assert!((skipped - inconclusive).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deliverable_probe_yields_full_confidence() {
        let scoring = ScoringConfig::default();
        let probe = MailboxProbe {
            deliverable: true,
            conclusive: true,
            detail: "RCPT accepted: OK".to_string(),
        };
        let confidence = weighted_confidence(&scoring, Some(&probe));
        assert!((confidence - 1.0).abs() < f64::EPSILON);
    }
}
