use thiserror::Error;

/// Structural problems that stop a ranking call before any matching happens
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid candidate {id}: {reason}")]
    InvalidCandidate { id: String, reason: String },
}
