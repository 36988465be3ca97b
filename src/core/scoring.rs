use crate::core::tags::{normalized_overlap, tag_overlap};
use crate::models::{
    Experience, InvolvementStyle, MatchOptions, PreferenceQuery, ScoreBreakdown, ScoringMode,
    ScoringWeights,
};

/// Calculate the score for an experience that already passed the hard filters
///
/// Scoring formula (continuous mode, default weights):
/// score = (
///     budget_closeness * 30 +      # Price midpoint near the stated budget
///     vibe_fraction * 20 +         # Share of requested vibes offered
///     tone_fraction * 8 +
///     flavour_fraction * 6 +
///     adventure_fit +              # +12 inside the range, -4 outside
///     involvement_match * 10       # Style agrees, or the candidate is Anything
/// )
///
/// Stepped mode swaps the budget curve for exact/near buckets and counts
/// shared tags instead of normalizing them. The total is never negative.
pub fn calculate_score(
    experience: &Experience,
    query: &PreferenceQuery,
    weights: &ScoringWeights,
    options: &MatchOptions,
) -> ScoreBreakdown {
    let budget = match options.scoring_mode {
        ScoringMode::Continuous => continuous_budget_score(experience, query, weights),
        ScoringMode::Stepped => {
            stepped_budget_score(experience, query, weights, options.near_budget_threshold)
        }
    };

    let overlap = |wanted: &[String], offered: &[String], weight: f64| match options.scoring_mode {
        ScoringMode::Continuous => normalized_overlap(wanted, offered) * weight,
        ScoringMode::Stepped => tag_overlap(wanted, offered) as f64 * weight,
    };

    let vibe = overlap(&query.vibe, &experience.vibe_tags, weights.vibe);
    let tone = overlap(&query.tone, &experience.tone_tags, weights.tone);
    let flavour = overlap(&query.flavour, &experience.flavour_tags, weights.flavour);
    let adventure = adventure_score(experience, query, weights);
    let involvement = involvement_score(experience, query, weights);

    let total = (budget + vibe + tone + flavour + adventure + involvement).max(0.0);

    ScoreBreakdown {
        budget,
        vibe,
        tone,
        flavour,
        adventure,
        involvement,
        total,
    }
}

/// Budget closeness (0-weight)
/// Linear decay of the distance between the price midpoint and the budget,
/// relative to the budget itself
#[inline]
fn continuous_budget_score(
    experience: &Experience,
    query: &PreferenceQuery,
    weights: &ScoringWeights,
) -> f64 {
    if !query.has_budget() {
        return 0.0;
    }

    let budget = query.budget_per_person as f64;
    let midpoint = experience.price_range().midpoint();
    let closeness = 1.0 - (midpoint - budget).abs() / budget.max(1.0);

    closeness.max(0.0) * weights.budget
}

#[inline]
fn stepped_budget_score(
    experience: &Experience,
    query: &PreferenceQuery,
    weights: &ScoringWeights,
    near_threshold: u32,
) -> f64 {
    if !query.has_budget() {
        return 0.0;
    }

    match experience.price_range().distance_to(query.budget_per_person) {
        0 => weights.budget,
        d if d < near_threshold => weights.budget_near,
        _ => 0.0,
    }
}

/// The only negative term, a nudge rather than a disqualifier
#[inline]
fn adventure_score(experience: &Experience, query: &PreferenceQuery, weights: &ScoringWeights) -> f64 {
    match query.adventure_level {
        Some(level) if experience.adventure_range().contains(level as u32) => weights.adventure,
        Some(_) => -weights.adventure_penalty,
        None => 0.0,
    }
}

#[inline]
fn involvement_score(
    experience: &Experience,
    query: &PreferenceQuery,
    weights: &ScoringWeights,
) -> f64 {
    // Only the candidate's own `Anything` is a wildcard
    let matches = experience.involvement_style == InvolvementStyle::Anything
        || experience.involvement_style == query.involvement;

    if matches {
        weights.involvement
    } else {
        0.0
    }
}
