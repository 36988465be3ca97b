//! Experience Match - preference matching service for curated dining experiences
//!
//! This library provides the ranking engine that turns a user's quiz answers into
//! a shortlist of catalog experiences, plus the catalog, cache and HTTP plumbing
//! around it. The engine is a hard-filter, score, rank pipeline with a relaxed
//! fallback when nothing passes the strict filters.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, MatchError, MatchResult};
pub use models::{Experience, PreferenceQuery, ScoredExperience, ScoringWeights, MatchOptions, RecommendRequest, RecommendResponse};
