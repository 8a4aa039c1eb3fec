//! Email Generation — renders a personalized outreach email for a
//! contact/company pair.
//!
//! Flow: select template (override → company trigger → general) →
//! assemble variables → substitute placeholders → clean up → score.
//!
//! `generate` never fails: any internal error degrades to a hard-coded
//! fallback email with the error annotated on the result, so callers always
//! receive sendable content.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::generation::templates::templates_for;
use crate::generation::variables::prepare_variables;
use crate::models::company::{CompanyRow, ContactRow};
use crate::models::TriggerType;

/// A rendered email. Transient — never persisted; only the eventual send
/// outcome is written back onto the contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedEmail {
    pub subject: String,
    pub body: String,
    pub template_type: String,
    /// 0.0–1.0, diagnostic only; never gates sending.
    pub personalization_score: f64,
    pub template_variables: BTreeMap<String, String>,
    pub generated_at: DateTime<Utc>,
    /// Present only when generation degraded to the fallback email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generates an email for the contact/company pair.
///
/// `template_override` takes precedence over the company's trigger type;
/// unknown override names fall back to the general template.
pub fn generate(
    contact: &ContactRow,
    company: &CompanyRow,
    template_override: Option<&str>,
) -> GeneratedEmail {
    match generate_inner(contact, company, template_override) {
        Ok(email) => email,
        Err(e) => {
            error!(
                "Email generation failed for contact {}: {e}",
                contact.id
            );
            fallback_email(contact, company, e.to_string())
        }
    }
}

fn generate_inner(
    contact: &ContactRow,
    company: &CompanyRow,
    template_override: Option<&str>,
) -> anyhow::Result<GeneratedEmail> {
    let trigger = template_override
        .and_then(TriggerType::parse)
        .or_else(|| TriggerType::parse(&company.trigger_type))
        .unwrap_or_default();

    let (subject_template, body_template) = templates_for(trigger);
    let vars = prepare_variables(contact, company);

    let subject = clean_text(&substitute(subject_template, &vars));
    let body = clean_text(&substitute(body_template, &vars));

    let score = personalization_score(&vars);

    Ok(GeneratedEmail {
        subject,
        body,
        template_type: trigger.as_str().to_string(),
        personalization_score: score,
        template_variables: vars,
        generated_at: Utc::now(),
        error: None,
    })
}

/// Literal `{name}` replacement against the variable map. Placeholders with
/// no matching variable are left verbatim — callers rely on this graceful
/// degradation.
pub fn substitute(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{key}}}");
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, value);
        }
    }
    result
}

fn inline_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("valid whitespace regex"))
}

fn space_before_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([,.!?])").expect("valid punctuation regex"))
}

/// Tidies rendered text: collapses runs of spaces/tabs within each line,
/// removes whitespace before punctuation, and trims every line. Paragraph
/// breaks are preserved.
pub fn clean_text(text: &str) -> String {
    let collapsed = inline_whitespace().replace_all(text, " ");
    let tightened = space_before_punctuation().replace_all(&collapsed, "$1");

    tightened
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Additive personalization score, capped at 1.0: +0.2 real first name,
/// +0.2 real company name, +0.3 non-general trigger, +0.2 known industry,
/// +0.1 any trigger-specific detail.
pub fn personalization_score(vars: &BTreeMap<String, String>) -> f64 {
    let mut score: f64 = 0.0;

    let has = |key: &str, placeholder: &str| {
        vars.get(key).is_some_and(|v| !v.is_empty() && v != placeholder)
    };

    if has("first_name", "there") {
        score += 0.2;
    }
    if has("company_name", "your company") {
        score += 0.2;
    }
    if vars.get("trigger_type").map(String::as_str) != Some("general") {
        score += 0.3;
    }
    if has("industry", "your industry") {
        score += 0.2;
    }
    let has_detail = ["hiring_role", "funding_details", "tech_observation"]
        .iter()
        .any(|key| vars.get(*key).is_some_and(|v| !v.is_empty()));
    if has_detail {
        score += 0.1;
    }

    score.min(1.0)
}

/// Minimal hand-written email used when template processing fails.
fn fallback_email(contact: &ContactRow, company: &CompanyRow, error: String) -> GeneratedEmail {
    let first_name = if contact.first_name.trim().is_empty() {
        "there"
    } else {
        contact.first_name.trim()
    };
    let company_name = if company.name.trim().is_empty() {
        "your company"
    } else {
        company.name.trim()
    };

    let body = format!(
        "Hi {first_name},\n\n\
         I came across {company_name} and was impressed by your work.\n\n\
         I specialize in building high-converting websites for growing companies. \
         My clients typically see significant increases in qualified leads within 90 days of launch.\n\n\
         Would a brief conversation about how a strategic website redesign could support \
         {company_name}'s growth goals be valuable?\n\n\
         Best regards,\n\
         [Your Name]\n\
         Website Design Specialist"
    );

    GeneratedEmail {
        subject: format!("Website Redesign Opportunity for {company_name}"),
        body,
        template_type: "fallback".to_string(),
        personalization_score: 0.0,
        template_variables: BTreeMap::new(),
        generated_at: Utc::now(),
        error: Some(error),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test fixtures
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_fixtures {
    use crate::models::company::{CompanyRow, ContactRow};
    use chrono::Utc;

    pub fn make_company(trigger_type: &str) -> CompanyRow {
        CompanyRow {
            id: 1,
            name: "TechCorp Solutions".to_string(),
            domain: "techcorp-solutions.com".to_string(),
            industry: Some("Software".to_string()),
            employee_count: Some(75),
            funding_stage: None,
            recent_funding_amount: None,
            recent_funding_date: None,
            website_technologies: None,
            trigger_type: trigger_type.to_string(),
            trigger_details: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn make_contact() -> ContactRow {
        ContactRow {
            id: 1,
            company_id: 1,
            first_name: "Sarah".to_string(),
            last_name: "Johnson".to_string(),
            email: "sarah.johnson@techcorp-solutions.com".to_string(),
            job_title: Some("Marketing Director".to_string()),
            linkedin_url: None,
            decision_maker_score: 0.9,
            email_validated: false,
            email_validation_result: None,
            contacted: false,
            contact_date: None,
            response_received: false,
            response_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::test_fixtures::{make_company, make_contact};
    use super::*;

    /// No `{...}` token that the trigger's template guarantees to populate
    /// may survive substitution.
    fn assert_no_unresolved_artifacts(text: &str) {
        for var in [
            "{first_name}",
            "{company_name}",
            "{company_domain}",
            "{industry}",
            "{hiring_role}",
            "{hiring_department}",
            "{funding_stage}",
            "{funding_details}",
            "{tech_observation}",
            "{business_focus}",
            "{website_observation}",
            "{company_focus}",
        ] {
            assert!(!text.contains(var), "unresolved {var} in: {text}");
        }
    }

    #[test]
    fn test_generate_resolves_all_variables_for_every_trigger() {
        let contact = make_contact();
        for trigger in ["hiring", "funding", "outdated_tech", "general"] {
            let mut company = make_company(trigger);
            company.trigger_details = Some(match trigger {
                "hiring" => "Currently hiring: Marketing Manager".to_string(),
                "outdated_tech" => "Website uses outdated technology: Flash".to_string(),
                _ => String::new(),
            });
            if trigger == "funding" {
                company.funding_stage = Some("Series A".to_string());
                company.recent_funding_amount = Some(5_000_000.0);
            }

            let email = generate(&contact, &company, None);
            assert_eq!(email.template_type, trigger);
            assert!(email.error.is_none());
            assert_no_unresolved_artifacts(&email.subject);
            assert_no_unresolved_artifacts(&email.body);
            assert!((0.0..=1.0).contains(&email.personalization_score));
        }
    }

    #[test]
    fn test_template_override_wins_over_trigger() {
        let contact = make_contact();
        let company = make_company("hiring");
        let email = generate(&contact, &company, Some("general"));
        assert_eq!(email.template_type, "general");
    }

    #[test]
    fn test_unknown_override_falls_back_to_company_trigger() {
        let contact = make_contact();
        let mut company = make_company("funding");
        company.funding_stage = Some("Seed".to_string());
        company.recent_funding_amount = Some(250_000.0);
        let email = generate(&contact, &company, Some("carrier-pigeon"));
        assert_eq!(email.template_type, "funding");
        assert!(email.body.contains("$250K"));
    }

    #[test]
    fn test_unknown_trigger_uses_general_template() {
        let contact = make_contact();
        let company = make_company("mystery");
        let email = generate(&contact, &company, None);
        assert_eq!(email.template_type, "general");
    }

    #[test]
    fn test_funding_email_embeds_formatted_amount() {
        let contact = make_contact();
        let mut company = make_company("funding");
        company.funding_stage = Some("Series A".to_string());
        company.recent_funding_amount = Some(5_000_000.0);
        let email = generate(&contact, &company, None);
        assert!(email.body.contains("Raising $5.0M is a significant milestone!"));
    }

    #[test]
    fn test_substitute_leaves_unknown_placeholders_verbatim() {
        let vars = BTreeMap::from([("known".to_string(), "value".to_string())]);
        let result = substitute("{known} and {unknown}", &vars);
        assert_eq!(result, "value and {unknown}");
    }

    #[test]
    fn test_clean_text_collapses_spaces_but_keeps_paragraphs() {
        let input = "Hi  Sarah ,\n\nSecond   paragraph .\nThird line";
        let cleaned = clean_text(input);
        assert_eq!(cleaned, "Hi Sarah,\n\nSecond paragraph.\nThird line");
    }

    #[test]
    fn test_clean_text_trims_lines_and_edges() {
        let cleaned = clean_text("  leading\n   indented   \n");
        assert_eq!(cleaned, "leading\nindented");
    }

    #[test]
    fn test_personalization_score_full_house() {
        let contact = make_contact();
        let mut company = make_company("hiring");
        company.trigger_details = Some("hiring: Growth Manager".to_string());
        let email = generate(&contact, &company, None);
        // 0.2 name + 0.2 company + 0.3 trigger + 0.2 industry + 0.1 detail
        assert!((email.personalization_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_personalization_score_anonymous_general() {
        let mut contact = make_contact();
        contact.first_name = String::new();
        let mut company = make_company("general");
        company.name = String::new();
        company.industry = None;
        let email = generate(&contact, &company, None);
        assert!((email.personalization_score - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_personalization_score_never_exceeds_one() {
        let contact = make_contact();
        let mut company = make_company("funding");
        company.funding_stage = Some("Series B".to_string());
        company.recent_funding_amount = Some(20_000_000.0);
        let email = generate(&contact, &company, None);
        assert!(email.personalization_score <= 1.0);
    }

    #[test]
    fn test_fallback_email_is_sendable() {
        let contact = make_contact();
        let company = make_company("general");
        let email = fallback_email(&contact, &company, "boom".to_string());
        assert!(email.subject.contains("TechCorp Solutions"));
        assert!(email.body.contains("Hi Sarah"));
        assert_eq!(email.template_type, "fallback");
        assert_eq!(email.error.as_deref(), Some("boom"));
    }
}
