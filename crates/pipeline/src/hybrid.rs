//! Hybrid combination of several scorers' rankings.
//!
//! Lists are merged with a strict inner join on recipe id: a recipe must
//! appear in every list to survive. An empty intersection yields an empty
//! result; there is no fallback to a single scorer.
//!
//! Joined candidates carry the per-source scores in
//! `metadata.component_scores`, most significant source first, and are
//! ordered by that score tuple (all descending), then by recipe id.

use data_loader::RecipeId;
use scorers::{CandidateMetadata, RankedCandidate, ScorerKind};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Component scores of a candidate: its own score unless it is already a join result
fn components(candidate: &RankedCandidate) -> Vec<(ScorerKind, f64)> {
    if candidate.metadata.component_scores.is_empty() {
        vec![(candidate.provenance, candidate.score)]
    } else {
        candidate.metadata.component_scores.clone()
    }
}

fn hybrid(recipe_id: RecipeId, component_scores: Vec<(ScorerKind, f64)>) -> RankedCandidate {
    let score = component_scores.first().map(|&(_, s)| s).unwrap_or(0.0);
    RankedCandidate {
        recipe_id,
        score,
        provenance: ScorerKind::Hybrid,
        metadata: CandidateMetadata { component_scores },
    }
}

/// Keep the first occurrence of every recipe id, preserving order
fn dedup_first(list: &[RankedCandidate]) -> Vec<&RankedCandidate> {
    let mut seen = HashSet::new();
    list.iter().filter(|c| seen.insert(c.recipe_id)).collect()
}

/// Inner join of two ranked lists on recipe id.
///
/// Output follows `left`'s order. Within each list the first occurrence of
/// an id wins. Each output carries left's components followed by right's.
pub fn join(left: &[RankedCandidate], right: &[RankedCandidate]) -> Vec<RankedCandidate> {
    let mut right_by_id: HashMap<RecipeId, &RankedCandidate> = HashMap::new();
    for candidate in right {
        right_by_id.entry(candidate.recipe_id).or_insert(candidate);
    }

    dedup_first(left)
        .into_iter()
        .filter_map(|l| {
            let r = right_by_id.get(&l.recipe_id)?;
            let mut scores = components(l);
            scores.extend(components(r));
            Some(hybrid(l.recipe_id, scores))
        })
        .collect()
}

/// Compare two joined candidates by their score tuples, all descending
fn tuple_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    let a_scores = a.metadata.component_scores.iter().map(|&(_, s)| s);
    let b_scores = b.metadata.component_scores.iter().map(|&(_, s)| s);
    for (x, y) in a_scores.zip(b_scores) {
        match y.total_cmp(&x) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.recipe_id.cmp(&b.recipe_id)
}

/// Merge the outputs of several scorers into one ranking.
///
/// The first list is the most significant source.
pub fn combine(scorer_outputs: &[Vec<RankedCandidate>], top_n: usize) -> Vec<RankedCandidate> {
    let Some((first, rest)) = scorer_outputs.split_first() else {
        return Vec::new();
    };

    let seed: Vec<RankedCandidate> = dedup_first(first)
        .into_iter()
        .map(|c| hybrid(c.recipe_id, components(c)))
        .collect();
    let mut joined = rest.iter().fold(seed, |acc, list| join(&acc, list));

    joined.sort_by(tuple_order);
    joined.truncate(top_n);

    debug!(
        "Hybrid combined {} lists into {} candidates",
        scorer_outputs.len(),
        joined.len()
    );
    joined
}

/// Named handle for the combiner, for symmetry with the scorers
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridCombiner;

impl HybridCombiner {
    pub fn name(&self) -> &'static str {
        ScorerKind::Hybrid.name()
    }

    pub fn combine(&self, scorer_outputs: &[Vec<RankedCandidate>], top_n: usize) -> Vec<RankedCandidate> {
        combine(scorer_outputs, top_n)
    }
}
