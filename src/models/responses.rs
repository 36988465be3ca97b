use serde::{Deserialize, Serialize};
use crate::models::domain::{Experience, PreferenceQuery, ScoredExperience};

/// Response for the recommend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub query: PreferenceQuery,
    #[serde(rename = "matchedCount")]
    pub matched_count: usize,
    #[serde(rename = "fallbackApplied")]
    pub fallback_applied: bool,
    pub results: Vec<ScoredExperience>,
}

/// List of catalog experiences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceListResponse {
    pub results: Vec<Experience>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Lead capture response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadResponse {
    pub ok: bool,
    #[serde(rename = "leadId")]
    pub lead_id: String,
}

/// Catalog connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProbeResponse {
    pub has_url: bool,
    pub has_base: bool,
    pub token_len: usize,
    pub upstream_status: Option<u16>,
    pub detail: Option<String>,
}
