//! Template variable assembly — contact/company fields plus trigger-specific
//! details extracted from `trigger_details` markers.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::company::{CompanyRow, ContactRow};
use crate::models::TriggerType;

fn hiring_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)hiring:\s*(.+)").expect("valid hiring marker regex"))
}

fn technology_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)technology:\s*(.+)").expect("valid technology marker regex"))
}

/// Builds the full substitution map for a contact/company pair.
///
/// Every value is a plain string; absent data falls back to neutral copy
/// ("there", "your company") so templates always render something sendable.
pub fn prepare_variables(
    contact: &ContactRow,
    company: &CompanyRow,
) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    // Contact variables
    let first_name = non_empty(&contact.first_name).unwrap_or("there");
    vars.insert("first_name".to_string(), first_name.to_string());
    vars.insert("last_name".to_string(), contact.last_name.clone());
    vars.insert(
        "full_name".to_string(),
        format!("{} {}", contact.first_name, contact.last_name)
            .trim()
            .to_string(),
    );
    vars.insert(
        "job_title".to_string(),
        contact
            .job_title
            .as_deref()
            .and_then(non_empty)
            .unwrap_or("team member")
            .to_string(),
    );

    // Company variables
    let company_name = non_empty(&company.name).unwrap_or("your company");
    vars.insert("company_name".to_string(), company_name.to_string());
    vars.insert(
        "company_domain".to_string(),
        non_empty(&company.domain).unwrap_or("your website").to_string(),
    );
    let industry = company.industry.as_deref().and_then(non_empty);
    vars.insert(
        "industry".to_string(),
        industry.unwrap_or("your industry").to_string(),
    );
    let employee_count = company.employee_count.unwrap_or(50);
    vars.insert("employee_count".to_string(), employee_count.to_string());

    // Trigger variables
    let trigger = TriggerType::parse(&company.trigger_type).unwrap_or_default();
    vars.insert("trigger_type".to_string(), trigger.as_str().to_string());
    let trigger_details = company.trigger_details.as_deref().unwrap_or("");
    vars.insert("trigger_details".to_string(), trigger_details.to_string());

    match trigger {
        TriggerType::Hiring => {
            let (role, department) = extract_hiring(trigger_details);
            vars.insert("hiring_role".to_string(), role);
            vars.insert("hiring_department".to_string(), department.to_string());
        }
        TriggerType::Funding => {
            let (stage, details) = extract_funding(company);
            vars.insert("funding_stage".to_string(), stage);
            vars.insert("funding_details".to_string(), details);
        }
        TriggerType::OutdatedTech => {
            vars.insert(
                "tech_observation".to_string(),
                extract_tech_observation(trigger_details),
            );
        }
        TriggerType::General => {}
    }

    // Secondary personalization, independent of trigger
    vars.insert(
        "business_focus".to_string(),
        business_focus(company_name, industry),
    );
    vars.insert(
        "website_observation".to_string(),
        website_observation(employee_count).to_string(),
    );
    vars.insert("company_focus".to_string(), company_focus(industry));

    vars
}

/// Parses a "hiring: <role>" marker out of trigger details and classifies
/// the role into a department for template copy.
pub fn extract_hiring(trigger_details: &str) -> (String, &'static str) {
    let role = hiring_marker()
        .captures(trigger_details)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "Marketing Manager".to_string());

    let role_lower = role.to_lowercase();
    let department = if ["marketing", "growth", "digital"]
        .iter()
        .any(|kw| role_lower.contains(kw))
    {
        "marketing"
    } else if ["sales", "business development", "account"]
        .iter()
        .any(|kw| role_lower.contains(kw))
    {
        "sales"
    } else {
        "team"
    };

    (role, department)
}

/// Formats a raised amount the way a human would write it in a sentence.
pub fn format_funding_amount(amount: f64) -> String {
    if amount >= 1_000_000.0 {
        format!("${:.1}M", amount / 1_000_000.0)
    } else {
        format!("${:.0}K", amount / 1_000.0)
    }
}

/// Funding stage plus the one-line milestone sentence; the sentence is
/// omitted entirely when no amount is recorded.
pub fn extract_funding(company: &CompanyRow) -> (String, String) {
    let stage = company
        .funding_stage
        .as_deref()
        .and_then(non_empty)
        .unwrap_or("funding")
        .to_string();

    let details = match company.recent_funding_amount {
        Some(amount) => format!(
            "Raising {} is a significant milestone!",
            format_funding_amount(amount)
        ),
        None => String::new(),
    };

    (stage, details)
}

/// Parses a "technology: <name>" marker into an observation sentence.
pub fn extract_tech_observation(trigger_details: &str) -> String {
    technology_marker()
        .captures(trigger_details)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            format!(
                "it's using {}, which could be limiting performance",
                m.as_str().trim()
            )
        })
        .unwrap_or_else(|| "some outdated technologies that could be modernized".to_string())
}

fn business_focus(company_name: &str, industry: Option<&str>) -> String {
    let name_lower = company_name.to_lowercase();
    if ["tech", "software", "app"].iter().any(|kw| name_lower.contains(kw)) {
        "technology solutions".to_string()
    } else if ["consulting", "services"].iter().any(|kw| name_lower.contains(kw)) {
        "consulting services".to_string()
    } else {
        match industry {
            Some(industry) => format!("work in {industry}"),
            None => "business".to_string(),
        }
    }
}

fn website_observation(employee_count: i32) -> &'static str {
    if employee_count > 100 {
        "it could better reflect your company's scale and expertise"
    } else {
        "some opportunities to improve conversion rates"
    }
}

fn company_focus(industry: Option<&str>) -> String {
    match industry {
        Some(industry) => format!("your approach to {industry}"),
        None => "your business model".to_string(),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::engine::test_fixtures::{make_company, make_contact};

    #[test]
    fn test_hiring_marker_extracts_role() {
        let (role, department) = extract_hiring("Currently hiring: Head of Growth");
        assert_eq!(role, "Head of Growth");
        assert_eq!(department, "marketing");
    }

    #[test]
    fn test_hiring_marker_is_case_insensitive() {
        let (role, _) = extract_hiring("HIRING: Sales Director");
        assert_eq!(role, "Sales Director");
    }

    #[test]
    fn test_hiring_defaults_without_marker() {
        let (role, department) = extract_hiring("growing fast");
        assert_eq!(role, "Marketing Manager");
        assert_eq!(department, "marketing");
    }

    #[test]
    fn test_hiring_department_classification() {
        assert_eq!(extract_hiring("hiring: Account Executive").1, "sales");
        assert_eq!(extract_hiring("hiring: Business Development Rep").1, "sales");
        assert_eq!(extract_hiring("hiring: Digital Strategist").1, "marketing");
        assert_eq!(extract_hiring("hiring: Office Administrator").1, "team");
    }

    #[test]
    fn test_funding_amount_millions() {
        assert_eq!(format_funding_amount(5_000_000.0), "$5.0M");
        assert_eq!(format_funding_amount(12_500_000.0), "$12.5M");
    }

    #[test]
    fn test_funding_amount_thousands() {
        assert_eq!(format_funding_amount(250_000.0), "$250K");
        assert_eq!(format_funding_amount(999_999.0), "$1000K");
    }

    #[test]
    fn test_funding_details_sentence_embeds_amount() {
        let mut company = make_company("funding");
        company.recent_funding_amount = Some(5_000_000.0);
        company.funding_stage = Some("Series A".to_string());
        let (stage, details) = extract_funding(&company);
        assert_eq!(stage, "Series A");
        assert_eq!(details, "Raising $5.0M is a significant milestone!");
    }

    #[test]
    fn test_funding_details_omitted_without_amount() {
        let mut company = make_company("funding");
        company.recent_funding_amount = None;
        company.funding_stage = None;
        let (stage, details) = extract_funding(&company);
        assert_eq!(stage, "funding");
        assert!(details.is_empty());
    }

    #[test]
    fn test_tech_observation_with_marker() {
        let obs = extract_tech_observation("Website uses outdated technology: jQuery 1.x");
        assert_eq!(obs, "it's using jQuery 1.x, which could be limiting performance");
    }

    #[test]
    fn test_tech_observation_default() {
        let obs = extract_tech_observation("old site");
        assert_eq!(obs, "some outdated technologies that could be modernized");
    }

    #[test]
    fn test_business_focus_keyed_on_company_name() {
        assert_eq!(business_focus("Acme Software", Some("Retail")), "technology solutions");
        assert_eq!(
            business_focus("Smith Consulting", Some("Retail")),
            "consulting services"
        );
        assert_eq!(business_focus("Acme", Some("Retail")), "work in Retail");
        assert_eq!(business_focus("Acme", None), "business");
    }

    #[test]
    fn test_website_observation_differs_by_size() {
        assert!(website_observation(150).contains("scale"));
        assert!(website_observation(50).contains("conversion"));
    }

    #[test]
    fn test_prepare_variables_falls_back_for_missing_data() {
        let mut contact = make_contact();
        contact.first_name = String::new();
        contact.job_title = None;
        let mut company = make_company("general");
        company.industry = None;
        let vars = prepare_variables(&contact, &company);
        assert_eq!(vars["first_name"], "there");
        assert_eq!(vars["job_title"], "team member");
        assert_eq!(vars["industry"], "your industry");
    }

    #[test]
    fn test_prepare_variables_includes_trigger_specifics() {
        let contact = make_contact();
        let mut company = make_company("hiring");
        company.trigger_details = Some("Currently hiring: VP Marketing".to_string());
        let vars = prepare_variables(&contact, &company);
        assert_eq!(vars["hiring_role"], "VP Marketing");
        assert_eq!(vars["hiring_department"], "marketing");
        assert!(!vars.contains_key("funding_details"));
    }
}
