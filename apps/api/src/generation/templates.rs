//! Outreach templates — one body/subject pair per trigger type.
//!
//! Placeholders use literal `{variable_name}` tokens filled by the engine;
//! unknown placeholders are deliberately left verbatim so a missing
//! variable degrades the copy instead of failing the send.

use crate::models::TriggerType;

pub const HIRING_BODY: &str = "\
Hi {first_name},

I noticed {company_name} is currently hiring for a {hiring_role} - congratulations on the growth!

As you bring on new {hiring_department} talent, having a high-converting website becomes even more critical for empowering your team to drive results. I took a quick look at {company_domain} and noticed {website_observation}.

I specialize in building websites for growing {industry} companies that need to convert their marketing investment into measurable results. My recent client in {industry} saw a 40% increase in qualified leads within 60 days of their new website launch.

Would a 10-minute conversation about how a strategic website redesign could support your {hiring_department} goals be valuable? I can share some quick wins that could be implemented even before your new hire starts.

Best regards,
[Your Name]
Website Design Specialist

P.S. I'd be happy to send over a free 5-minute audit video showing specific opportunities I spotted on {company_domain} - no strings attached.";

pub const FUNDING_BODY: &str = "\
Hi {first_name},

Congratulations on {company_name}'s recent {funding_stage} round! {funding_details}

As you scale with this new investment, your website becomes a critical asset for converting that funding into market leadership. I specialize in helping funded {industry} companies build websites that attract top talent, convert enterprise customers, and establish market authority.

I took a quick look at {company_domain} and see some immediate opportunities to better reflect {company_name}'s growth trajectory and funding success.

My recent client, a Series A {industry} startup, saw their enterprise demo requests increase by 65% after we redesigned their site to better communicate their funded status and growth potential.

Would a brief conversation about aligning your website with your post-funding growth goals be valuable? I can share some specific strategies that have worked well for other funded companies in {industry}.

Best regards,
[Your Name]
Website Design Specialist for Growing Companies

P.S. Happy to send a quick audit showing how to better leverage your funding announcement on your website.";

pub const OUTDATED_TECH_BODY: &str = "\
Hi {first_name},

I was researching {industry} companies and came across {company_name}. Your {business_focus} looks impressive!

I noticed {company_domain} is using some older web technologies that might be limiting your site's performance and search visibility. {tech_observation}

In today's competitive {industry} landscape, website performance directly impacts lead generation and customer trust. I recently helped a similar {industry} company modernize their site, resulting in 50% faster load times and a 35% increase in contact form submissions.

Would a 15-minute conversation about modernizing {company_name}'s web presence be valuable? I can share some quick technical wins that could improve your site's performance immediately.

Best regards,
[Your Name]
Website Performance Specialist

P.S. I'd be happy to run a free technical audit of {company_domain} and send you a summary of the biggest opportunities - takes me 10 minutes, could save you hours of research.";

pub const GENERAL_BODY: &str = "\
Hi {first_name},

I came across {company_name} while researching innovative {industry} companies and was impressed by {company_focus}.

I specialize in building high-converting websites for {industry} companies that are serious about growth. My clients typically see 40-60% increases in qualified leads within 90 days of launch.

I took a quick look at {company_domain} and noticed some opportunities to better showcase {company_name}'s expertise and convert more visitors into customers.

Would a brief conversation about how a strategic website redesign could support {company_name}'s growth goals be valuable?

Best regards,
[Your Name]
Website Design Specialist

P.S. Happy to send over a free audit of {company_domain} showing the biggest opportunities I spotted.";

pub const HIRING_SUBJECT: &str = "Website support for {company_name}'s new {hiring_role}?";
pub const FUNDING_SUBJECT: &str = "Congrats on the {funding_stage} - website alignment opportunity";
pub const OUTDATED_TECH_SUBJECT: &str = "Quick website performance opportunity for {company_name}";
pub const GENERAL_SUBJECT: &str = "Website optimization opportunity for {company_name}";

/// Returns the (subject, body) template pair for a trigger.
pub fn templates_for(trigger: TriggerType) -> (&'static str, &'static str) {
    match trigger {
        TriggerType::Hiring => (HIRING_SUBJECT, HIRING_BODY),
        TriggerType::Funding => (FUNDING_SUBJECT, FUNDING_BODY),
        TriggerType::OutdatedTech => (OUTDATED_TECH_SUBJECT, OUTDATED_TECH_BODY),
        TriggerType::General => (GENERAL_SUBJECT, GENERAL_BODY),
    }
}

/// Human-facing catalog entry for the template listing endpoint.
pub struct TemplateInfo {
    pub trigger: TriggerType,
    pub name: &'static str,
    pub description: &'static str,
}

pub const TEMPLATE_CATALOG: [TemplateInfo; 4] = [
    TemplateInfo {
        trigger: TriggerType::Hiring,
        name: "Hiring Trigger",
        description: "For companies currently hiring marketing/sales roles",
    },
    TemplateInfo {
        trigger: TriggerType::Funding,
        name: "Funding Trigger",
        description: "For recently funded companies",
    },
    TemplateInfo {
        trigger: TriggerType::OutdatedTech,
        name: "Outdated Technology",
        description: "For companies using outdated web technologies",
    },
    TemplateInfo {
        trigger: TriggerType::General,
        name: "General Outreach",
        description: "Generic template for any company",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_trigger_has_a_template_pair() {
        for trigger in [
            TriggerType::Hiring,
            TriggerType::Funding,
            TriggerType::OutdatedTech,
            TriggerType::General,
        ] {
            let (subject, body) = templates_for(trigger);
            assert!(!subject.is_empty());
            assert!(body.contains("{first_name}"));
        }
    }

    #[test]
    fn test_catalog_covers_all_triggers() {
        let triggers: Vec<_> = TEMPLATE_CATALOG.iter().map(|t| t.trigger).collect();
        assert!(triggers.contains(&TriggerType::Hiring));
        assert!(triggers.contains(&TriggerType::Funding));
        assert!(triggers.contains(&TriggerType::OutdatedTech));
        assert!(triggers.contains(&TriggerType::General));
    }
}
