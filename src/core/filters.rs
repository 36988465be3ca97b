use crate::core::tags::{contains_tag, shares_any};
use crate::models::{BudgetPolicy, Experience, PreferenceQuery};

/// How strictly the hard filter stage is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// Every hard constraint is enforced
    Strict,
    /// Party size, group and budget are waived. Mode and hard no's still apply.
    Relaxed,
}

/// Candidate's setting equals the requested one (or none was requested)
#[inline]
pub fn matches_mode(experience: &Experience, query: &PreferenceQuery) -> bool {
    query.mode.map_or(true, |mode| experience.mode == mode)
}

#[inline]
pub fn fits_party_size(experience: &Experience, query: &PreferenceQuery) -> bool {
    experience.party_range().contains(query.party_size)
}

/// Empty suitability accepts any group
#[inline]
pub fn suits_group(experience: &Experience, query: &PreferenceQuery) -> bool {
    match &query.group {
        Some(group) if !experience.group_suitability.is_empty() => {
            contains_tag(&experience.group_suitability, group)
        }
        _ => true,
    }
}

#[inline]
pub fn fits_budget(experience: &Experience, query: &PreferenceQuery) -> bool {
    !query.has_budget() || experience.price_range().contains(query.budget_per_person)
}

/// True when any of the user's hard no's is something the experience cannot accommodate
#[inline]
pub fn conflicts_with_hard_nos(experience: &Experience, query: &PreferenceQuery) -> bool {
    shares_any(&query.hard_nos, &experience.hard_exclusions)
}

/// Check if an experience survives the hard filter stage
pub fn passes_hard_filters(
    experience: &Experience,
    query: &PreferenceQuery,
    stage: FilterStage,
    budget_policy: BudgetPolicy,
) -> bool {
    // Explicit refusals, never relaxed
    if !matches_mode(experience, query) || conflicts_with_hard_nos(experience, query) {
        return false;
    }

    if stage == FilterStage::Relaxed {
        return true;
    }

    if !fits_party_size(experience, query) || !suits_group(experience, query) {
        return false;
    }

    budget_policy == BudgetPolicy::Advisory || fits_budget(experience, query)
}
