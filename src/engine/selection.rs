//! Greedy diverse selection: walk the value-sorted candidate list once,
//! keeping every candidate that clears the minimum distance from all picks so
//! far. The list is sorted a single time up front and entries are only ever
//! dropped, never re-ordered, so one forward scan replaces the naive
//! re-filter-and-re-sort round trip.

use crate::data::company::Company;

/// Stable descending sort by value. Draw order is preserved on ties; unset
/// values sort as zero.
pub fn sort_by_value_desc(candidates: &mut [Company]) {
    candidates.sort_by(|a, b| {
        b.value
            .unwrap_or(0.0)
            .total_cmp(&a.value.unwrap_or(0.0))
    });
}

/// Select up to `max_count` recommendations from a value-sorted candidate
/// list such that every pair of picks is at least `min_distance_km` apart.
/// Returns fewer when the list runs dry.
pub fn select_diverse<F>(
    sorted: Vec<Company>,
    max_count: usize,
    min_distance_km: f64,
    mut distance_km: F,
) -> Vec<Company>
where
    F: FnMut(&Company, &Company) -> f64,
{
    let mut picks: Vec<Company> = Vec::new();
    for candidate in sorted {
        if picks.len() >= max_count {
            break;
        }
        if picks
            .iter()
            .all(|pick| distance_km(pick, &candidate) >= min_distance_km)
        {
            picks.push(candidate);
        }
    }
    picks
}

/// Naive reference: each round re-sorts the remaining candidates, takes the
/// head, and filters out everything too close to it. Kept for the
/// differential test proving the single-pass variant equivalent.
pub fn select_diverse_reference<F>(
    mut remaining: Vec<Company>,
    max_count: usize,
    min_distance_km: f64,
    mut distance_km: F,
) -> Vec<Company>
where
    F: FnMut(&Company, &Company) -> f64,
{
    let mut picks: Vec<Company> = Vec::new();
    while picks.len() < max_count && !remaining.is_empty() {
        sort_by_value_desc(&mut remaining);
        let best = remaining.remove(0);
        remaining.retain(|candidate| distance_km(&best, candidate) >= min_distance_km);
        picks.push(best);
    }
    picks
}
