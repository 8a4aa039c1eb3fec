pub mod campaign;
pub mod company;

use serde::{Deserialize, Serialize};

/// Business event that justified discovering a company and that keys the
/// outreach template used for its contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Hiring,
    Funding,
    OutdatedTech,
    #[default]
    General,
}

impl TriggerType {
    /// The three triggers the discovery engine actually searches on.
    /// `General` is a template fallback, not a discoverable trigger.
    pub const DISCOVERABLE: [TriggerType; 3] = [
        TriggerType::Hiring,
        TriggerType::Funding,
        TriggerType::OutdatedTech,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hiring" => Some(TriggerType::Hiring),
            "funding" => Some(TriggerType::Funding),
            "outdated_tech" => Some(TriggerType::OutdatedTech),
            "general" => Some(TriggerType::General),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Hiring => "hiring",
            TriggerType::Funding => "funding",
            TriggerType::OutdatedTech => "outdated_tech",
            TriggerType::General => "general",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_type_round_trips_through_str() {
        for trigger in [
            TriggerType::Hiring,
            TriggerType::Funding,
            TriggerType::OutdatedTech,
            TriggerType::General,
        ] {
            assert_eq!(TriggerType::parse(trigger.as_str()), Some(trigger));
        }
    }

    #[test]
    fn test_trigger_type_rejects_unknown() {
        assert_eq!(TriggerType::parse("acquisition"), None);
        assert_eq!(TriggerType::parse(""), None);
    }

    #[test]
    fn test_trigger_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&TriggerType::OutdatedTech).unwrap();
        assert_eq!(json, "\"outdated_tech\"");
        let back: TriggerType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TriggerType::OutdatedTech);
    }

    #[test]
    fn test_general_is_not_discoverable() {
        assert!(!TriggerType::DISCOVERABLE.contains(&TriggerType::General));
    }
}
