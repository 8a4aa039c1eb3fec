use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of an email campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CampaignStatus::Draft),
            "active" => Some(CampaignStatus::Active),
            "paused" => Some(CampaignStatus::Paused),
            "completed" => Some(CampaignStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }
}

/// A reusable template pair plus send/response counters. Campaigns are
/// managed through plain CRUD and are not consumed by the engines.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CampaignRow {
    pub id: i64,
    pub name: String,
    pub trigger_type: String,
    pub email_template: String,
    pub subject_template: String,
    pub status: String,
    pub emails_sent: i32,
    pub responses_received: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
        ] {
            assert_eq!(CampaignStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert_eq!(CampaignStatus::parse("archived"), None);
    }

    #[test]
    fn test_default_status_is_draft() {
        assert_eq!(CampaignStatus::default(), CampaignStatus::Draft);
    }
}
