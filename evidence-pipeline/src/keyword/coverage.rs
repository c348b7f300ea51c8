use std::collections::{BTreeMap, HashSet};

use common::types::{KeyTermSet, MatchRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageTuning {
    /// Records taken per term while walking the match-count buckets downwards.
    pub priority_take: usize,
    pub per_term_cap: usize,
    pub union_cap: usize,
}

impl Default for CoverageTuning {
    fn default() -> Self {
        Self {
            priority_take: 5,
            per_term_cap: 10,
            union_cap: 20,
        }
    }
}

/// Picks a bounded, deduplicated set of representative records for a question.
///
/// Each key term first collects records co-mentioning many terms, then tops up
/// from the sparsest buckets so single-term hits are represented too. Records are
/// returned in the order they were first selected.
pub fn select_representatives(
    key_terms: &KeyTermSet,
    records: &[MatchRecord],
    tuning: &CoverageTuning,
) -> Vec<MatchRecord> {
    let mut selected: Vec<&MatchRecord> = Vec::new();
    let mut seen: HashSet<&MatchRecord> = HashSet::new();

    for term in key_terms.terms() {
        for record in select_for_term(term, records, tuning) {
            if selected.len() >= tuning.union_cap {
                break;
            }
            if seen.insert(record) {
                selected.push(record);
            }
        }
    }

    selected.into_iter().cloned().collect()
}

fn select_for_term<'a>(
    term: &str,
    records: &'a [MatchRecord],
    tuning: &CoverageTuning,
) -> Vec<&'a MatchRecord> {
    // Buckets keep corpus order because records are already in corpus order.
    let mut buckets: BTreeMap<usize, Vec<&MatchRecord>> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|record| record.matched_key_terms.iter().any(|matched| matched == term))
    {
        buckets
            .entry(record.matched_key_terms_count)
            .or_default()
            .push(record);
    }

    let mut picked: Vec<&MatchRecord> = Vec::new();

    for bucket in buckets.values().rev() {
        let need = tuning.priority_take.saturating_sub(picked.len());
        picked.extend(bucket.iter().take(need));
        if picked.len() >= tuning.priority_take {
            break;
        }
    }

    if picked.len() < tuning.per_term_cap {
        // The densest bucket was drained by the priority pass. Records from the
        // other buckets may be picked twice here; the union collapses them.
        let densest = buckets.keys().next_back().copied();
        for (_, bucket) in buckets.iter().filter(|(count, _)| Some(**count) != densest) {
            let need = tuning.per_term_cap.saturating_sub(picked.len());
            picked.extend(bucket.iter().take(need));
            if picked.len() >= tuning.per_term_cap {
                break;
            }
        }
    }

    picked.truncate(tuning.per_term_cap);
    picked
}
