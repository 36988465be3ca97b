use std::cmp::Ordering;

use crate::core::{
    error::MatchError,
    filters::{passes_hard_filters, FilterStage},
    scoring::calculate_score,
};
use crate::models::{
    Experience, MatchOptions, PreferenceQuery, ScoreBreakdown, ScoredExperience, ScoringWeights,
};

/// Result of the ranking process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matches: Vec<ScoredExperience>,
    /// Candidates that passed the strict hard filter stage, before truncation
    pub matched_count: usize,
    /// Soft constraints were waived because the strict stage kept nothing
    pub fallback_applied: bool,
    pub query: PreferenceQuery,
}

/// Main ranking orchestrator - implements the filter/score/rank pipeline
///
/// # Pipeline Stages
/// 1. Structural validation of query and catalog
/// 2. Strict hard filters, relaxed if nothing survives
/// 3. Scoring
/// 4. Sorting (score descending, id ascending) and truncation
///
/// The matcher owns no per-request state and can be shared across workers.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    options: MatchOptions,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, options: MatchOptions) -> Self {
        Self { weights, options }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            options: MatchOptions::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Rank `candidates` against `query`, keeping the configured top N
    pub fn rank(
        &self,
        query: &PreferenceQuery,
        candidates: &[Experience],
    ) -> Result<MatchResult, MatchError> {
        self.rank_top(query, candidates, self.options.top_n, false)
    }

    /// Rank `candidates` against `query`
    ///
    /// # Arguments
    /// * `query` - The user's preferences
    /// * `candidates` - Catalog snapshot, never modified
    /// * `limit` - Maximum number of results to return
    /// * `explain` - Attach a per-term score breakdown to each result
    ///
    /// # Returns
    /// The ranked results, or a structural error if the query or a candidate
    /// is malformed. An empty catalog is not an error.
    pub fn rank_top(
        &self,
        query: &PreferenceQuery,
        candidates: &[Experience],
        limit: usize,
        explain: bool,
    ) -> Result<MatchResult, MatchError> {
        validate_query(query)?;
        for candidate in candidates {
            validate_candidate(candidate)?;
        }

        let policy = self.options.budget_policy;
        let filter = |stage: FilterStage| -> Vec<&Experience> {
            candidates
                .iter()
                .filter(|exp| passes_hard_filters(exp, query, stage, policy))
                .collect()
        };

        let strict = filter(FilterStage::Strict);
        let matched_count = strict.len();

        let (eligible, fallback_applied) = if strict.is_empty() && !candidates.is_empty() {
            tracing::debug!("No candidates passed strict filters, relaxing soft constraints");
            (filter(FilterStage::Relaxed), true)
        } else {
            (strict, false)
        };

        let mut scored: Vec<(&Experience, ScoreBreakdown)> = eligible
            .into_iter()
            .map(|exp| (exp, calculate_score(exp, query, &self.weights, &self.options)))
            .collect();

        // Sort by score (descending) and then by id (ascending)
        scored.sort_by(|(a, a_score), (b, b_score)| compare_ranked(a, a_score, b, b_score));

        let eligible_count = scored.len();
        scored.truncate(limit);

        tracing::debug!(
            "Ranked {} candidates: {} strict, {} eligible, {} returned (fallback: {})",
            candidates.len(),
            matched_count,
            eligible_count,
            scored.len(),
            fallback_applied
        );

        let matches = scored
            .into_iter()
            .map(|(exp, breakdown)| ScoredExperience {
                experience: exp.clone(),
                score: breakdown.total,
                breakdown: explain.then_some(breakdown),
            })
            .collect();

        Ok(MatchResult {
            matches,
            matched_count,
            fallback_applied,
            query: query.clone(),
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[inline]
fn compare_ranked(
    a: &Experience,
    a_score: &ScoreBreakdown,
    b: &Experience,
    b_score: &ScoreBreakdown,
) -> Ordering {
    b_score
        .total
        .total_cmp(&a_score.total)
        .then_with(|| a.id.cmp(&b.id))
}

fn validate_query(query: &PreferenceQuery) -> Result<(), MatchError> {
    if query.party_size < 1 {
        return Err(MatchError::InvalidQuery("partySize must be at least 1".into()));
    }
    if let Some(level) = query.adventure_level {
        if !(1..=3).contains(&level) {
            return Err(MatchError::InvalidQuery(format!(
                "adventureLevel must be between 1 and 3, got {}",
                level
            )));
        }
    }
    Ok(())
}

fn validate_candidate(experience: &Experience) -> Result<(), MatchError> {
    let invalid = |reason: &str| MatchError::InvalidCandidate {
        id: experience.id.clone(),
        reason: reason.to_string(),
    };

    if experience.id.trim().is_empty() {
        return Err(invalid("missing id"));
    }
    if !experience.party_range().is_well_formed() {
        return Err(invalid("minParty exceeds maxParty"));
    }
    if !experience.price_range().is_well_formed() {
        return Err(invalid("minPricePP exceeds maxPricePP"));
    }
    if !experience.adventure_range().is_well_formed() {
        return Err(invalid("minAdventure exceeds maxAdventure"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPolicy, InvolvementStyle, Mode};

    fn create_candidate(id: &str, mode: Mode, min_party: u32, max_party: u32) -> Experience {
        Experience {
            id: id.to_string(),
            title: format!("Experience {}", id),
            description: String::new(),
            mode,
            formats: vec![],
            cuisine: String::new(),
            min_party,
            max_party: Some(max_party),
            min_price_pp: 80,
            max_price_pp: Some(150),
            group_suitability: vec![],
            vibe_tags: vec![],
            tone_tags: vec![],
            flavour_tags: vec![],
            min_adventure: 1,
            max_adventure: Some(3),
            involvement_style: InvolvementStyle::Anything,
            hard_exclusions: vec![],
        }
    }

    fn create_query() -> PreferenceQuery {
        PreferenceQuery {
            mode: Some(Mode::Home),
            budget_per_person: 100,
            ..PreferenceQuery::for_party(4)
        }
    }

    #[test]
    fn test_rank_basic() {
        let matcher = Matcher::with_default_weights();
        let candidates = vec![
            create_candidate("1", Mode::Home, 2, 6),
            create_candidate("2", Mode::Out, 2, 6),   // Wrong mode
            create_candidate("3", Mode::Home, 6, 10), // Party too small
        ];

        let result = matcher.rank(&create_query(), &candidates).unwrap();

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].experience.id, "1");
        assert_eq!(result.matched_count, 1);
        assert!(!result.fallback_applied);
    }

    #[test]
    fn test_fallback_keeps_mode() {
        let matcher = Matcher::with_default_weights();
        let candidates = vec![
            create_candidate("1", Mode::Home, 6, 10),
            create_candidate("2", Mode::Out, 2, 6),
        ];

        let result = matcher.rank(&create_query(), &candidates).unwrap();

        assert!(result.fallback_applied);
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].experience.id, "1");
    }

    #[test]
    fn test_empty_catalog() {
        let matcher = Matcher::with_default_weights();
        let result = matcher.rank(&create_query(), &[]).unwrap();

        assert!(result.matches.is_empty());
        assert_eq!(result.matched_count, 0);
        assert!(!result.fallback_applied);
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::with_default_weights();
        let candidates: Vec<Experience> = (0..20)
            .map(|i| create_candidate(&format!("{:02}", i), Mode::Home, 1, 10))
            .collect();

        let result = matcher.rank(&create_query(), &candidates).unwrap();
        assert_eq!(result.matches.len(), 6);
        assert_eq!(result.matched_count, 20);

        let result = matcher.rank_top(&create_query(), &candidates, 3, false).unwrap();
        assert_eq!(result.matches.len(), 3);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let matcher = Matcher::with_default_weights();
        let candidates = vec![
            create_candidate("b", Mode::Home, 1, 10),
            create_candidate("a", Mode::Home, 1, 10),
            create_candidate("c", Mode::Home, 1, 10),
        ];

        let result = matcher.rank(&create_query(), &candidates).unwrap();
        let ids: Vec<&str> = result.matches.iter().map(|m| m.experience.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_explain_attaches_breakdown() {
        let matcher = Matcher::with_default_weights();
        let candidates = vec![create_candidate("1", Mode::Home, 1, 10)];

        let plain = matcher.rank(&create_query(), &candidates).unwrap();
        assert!(plain.matches[0].breakdown.is_none());

        let explained = matcher.rank_top(&create_query(), &candidates, 6, true).unwrap();
        let breakdown = explained.matches[0].breakdown.unwrap();
        assert_eq!(breakdown.total, explained.matches[0].score);
    }

    #[test]
    fn test_advisory_budget() {
        let options = MatchOptions {
            budget_policy: BudgetPolicy::Advisory,
            ..MatchOptions::default()
        };
        let matcher = Matcher::new(ScoringWeights::default(), options);
        let mut query = create_query();
        query.budget_per_person = 500;

        let result = matcher.rank(&query, &[create_candidate("1", Mode::Home, 1, 10)]).unwrap();
        assert_eq!(result.matched_count, 1);
        assert!(!result.fallback_applied);
    }

    #[test]
    fn test_invalid_query() {
        let matcher = Matcher::with_default_weights();
        let mut query = create_query();
        query.party_size = 0;
        assert!(matches!(
            matcher.rank(&query, &[]),
            Err(MatchError::InvalidQuery(_))
        ));

        let mut query = create_query();
        query.adventure_level = Some(4);
        assert!(matcher.rank(&query, &[]).is_err());
    }

    #[test]
    fn test_invalid_candidate() {
        let matcher = Matcher::with_default_weights();
        let broken = create_candidate("1", Mode::Home, 8, 2);

        let err = matcher.rank(&create_query(), &[broken]).unwrap_err();
        assert_eq!(
            err,
            MatchError::InvalidCandidate {
                id: "1".to_string(),
                reason: "minParty exceeds maxParty".to_string(),
            }
        );
    }
}
