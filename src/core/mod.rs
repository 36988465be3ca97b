// Core algorithm exports
pub mod error;
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod tags;

pub use error::MatchError;
pub use filters::{
    conflicts_with_hard_nos, fits_budget, fits_party_size, matches_mode, passes_hard_filters,
    suits_group, FilterStage,
};
pub use matcher::{MatchResult, Matcher};
pub use scoring::calculate_score;
pub use tags::{contains_tag, normalize_tag, normalized_overlap, shares_any, tag_overlap};
