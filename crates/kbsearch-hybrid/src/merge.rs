use std::collections::HashSet;

use kbsearch_core::types::{Candidate, IdentityKey};

/// Combine two candidate lists into one ranked, duplicate-free list.
///
/// When the same item appears more than once, the first occurrence wins,
/// scanning `primary` before `secondary`; its score is kept even if a later
/// duplicate scored higher. The result is stably sorted by score, highest
/// first, and is not truncated.
pub fn merge(primary: Vec<Candidate>, secondary: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<IdentityKey> = HashSet::with_capacity(primary.len() + secondary.len());
    let mut merged: Vec<Candidate> = primary.into_iter().chain(secondary).filter(|c| seen.insert(c.identity_key())).collect();
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}
