use std::collections::HashSet;

/// Canonical form used for every tag comparison
#[inline]
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn tag_set(tags: &[String]) -> HashSet<String> {
    tags.iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Case-insensitive membership test
#[inline]
pub fn contains_tag(tags: &[String], needle: &str) -> bool {
    let needle = normalize_tag(needle);
    tags.iter().any(|t| normalize_tag(t) == needle)
}

/// Number of distinct query tags present in the candidate's tags
pub fn tag_overlap(query: &[String], candidate: &[String]) -> usize {
    if query.is_empty() || candidate.is_empty() {
        return 0;
    }
    let candidate = tag_set(candidate);
    tag_set(query).intersection(&candidate).count()
}

/// Fraction (0-1) of the distinct query tags the candidate satisfies
///
/// An empty query set yields 0 rather than 1 so that a user who stated no
/// preference does not inflate every candidate equally.
pub fn normalized_overlap(query: &[String], candidate: &[String]) -> f64 {
    let wanted = tag_set(query);
    if wanted.is_empty() {
        return 0.0;
    }
    let shared = wanted.intersection(&tag_set(candidate)).count();
    shared as f64 / wanted.len() as f64
}

/// True when the two sets share at least one tag
pub fn shares_any(left: &[String], right: &[String]) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    let right = tag_set(right);
    left.iter().any(|t| right.contains(&normalize_tag(t)))
}
