use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{InvolvementStyle, Lead, Mode, PreferenceQuery};

/// Request to rank the catalog against a set of preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub group: Option<String>,
    #[validate(required, range(min = 1, max = 1000))]
    #[serde(default, alias = "party_size", rename = "partySize")]
    pub party_size: Option<u32>,
    #[serde(default, alias = "budget_pp", alias = "budgetPP", rename = "budgetPerPerson")]
    pub budget_per_person: Option<u32>,
    #[serde(default)]
    pub vibe: Vec<String>,
    #[serde(default)]
    pub tone: Vec<String>,
    #[serde(default)]
    pub flavour: Vec<String>,
    #[validate(range(min = 1, max = 3))]
    #[serde(default, alias = "adventure", rename = "adventureLevel")]
    pub adventure_level: Option<u8>,
    #[serde(default)]
    pub involvement: Option<InvolvementStyle>,
    #[serde(default, alias = "hard_nos", rename = "hardNos")]
    pub hard_nos: Vec<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    pub explain: bool,
    #[serde(default)]
    pub lead: Option<LeadDetails>,
}

impl RecommendRequest {
    /// Build the normalized query; blank group and tag entries are dropped
    pub fn to_query(&self) -> PreferenceQuery {
        PreferenceQuery {
            mode: self.mode,
            group: self
                .group
                .as_ref()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty()),
            party_size: self.party_size.unwrap_or_default(),
            budget_per_person: self.budget_per_person.unwrap_or_default(),
            vibe: clean_tags(&self.vibe),
            tone: clean_tags(&self.tone),
            flavour: clean_tags(&self.flavour),
            adventure_level: self.adventure_level,
            involvement: self.involvement.unwrap_or_default(),
            hard_nos: clean_tags(&self.hard_nos),
        }
    }
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Optional lead captured alongside a recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quiz: Option<serde_json::Value>,
}

/// Request to store a lead
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LeadRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[validate(required)]
    #[serde(default)]
    pub quiz: Option<serde_json::Value>,
    #[serde(default, alias = "selected_ids", rename = "selectedIds")]
    pub selected_ids: Vec<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl LeadRequest {
    pub fn into_lead(self) -> Lead {
        let payload = self.payload.unwrap_or(serde_json::Value::Null);
        let budget_pp = payload
            .get("budget_pp")
            .or_else(|| payload.get("budgetPerPerson"))
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok());
        let group = payload
            .get("group")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Lead {
            name: self.name.unwrap_or_default(),
            quiz: self.quiz.unwrap_or(serde_json::Value::Null),
            selected_ids: self.selected_ids,
            budget_pp,
            group,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Query string for looking up experiences by record id
#[derive(Debug, Clone, Deserialize)]
pub struct ByIdsQuery {
    #[serde(default)]
    pub ids: String,
}

impl ByIdsQuery {
    pub fn parsed_ids(&self) -> Vec<String> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
