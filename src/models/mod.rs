// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BudgetPolicy, Experience, InclusiveRange, InvolvementStyle, Lead, MatchOptions, Mode,
    PreferenceQuery, ScoreBreakdown, ScoredExperience, ScoringMode, ScoringWeights,
};
pub use requests::{ByIdsQuery, LeadDetails, LeadRequest, RecommendRequest};
pub use responses::{
    CatalogProbeResponse, ErrorResponse, ExperienceListResponse, HealthResponse, LeadResponse,
    RecommendResponse,
};
