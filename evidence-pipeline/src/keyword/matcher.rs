use std::collections::HashMap;

use aho_corasick::{AhoCorasick, MatchKind};
use common::{
    error::AppError,
    types::{KeyTermSet, MatchRecord, TextBlock},
};
use tracing::debug;

/// Multi-pattern matcher over a question's key terms and their synonyms.
///
/// Every surface form is compiled into one automaton, so a corpus scan costs
/// one pass per block regardless of how many patterns there are. A hit on a
/// synonym is attributed to every key term that registered it.
pub struct KeywordMatcher {
    automaton: AhoCorasick,
    pattern_terms: Vec<Vec<usize>>,
    terms: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(key_terms: &KeyTermSet) -> Result<Self, AppError> {
        let mut patterns: Vec<&str> = Vec::new();
        let mut pattern_terms: Vec<Vec<usize>> = Vec::new();
        let mut pattern_ids: HashMap<&str, usize> = HashMap::new();

        for (term_idx, form) in key_terms.surface_forms() {
            let pattern_id = *pattern_ids.entry(form).or_insert_with(|| {
                patterns.push(form);
                pattern_terms.push(Vec::new());
                patterns.len().saturating_sub(1)
            });
            if let Some(owners) = pattern_terms.get_mut(pattern_id) {
                if !owners.contains(&term_idx) {
                    owners.push(term_idx);
                }
            }
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|err| AppError::Matcher(format!("failed to build key term automaton: {err}")))?;

        debug!(
            key_terms = key_terms.len(),
            patterns = patterns.len(),
            "built key term automaton"
        );

        Ok(Self {
            automaton,
            pattern_terms,
            terms: key_terms.terms().to_vec(),
        })
    }

    /// Indices of the key terms found in `text`, ascending.
    pub fn matched_term_indices(&self, text: &str) -> Vec<usize> {
        let mut hits = vec![false; self.terms.len()];
        let mut remaining = self.terms.len();

        // Overlapping search so a short term nested inside a longer synonym still counts.
        for found in self.automaton.find_overlapping_iter(text) {
            let owners = self
                .pattern_terms
                .get(found.pattern().as_usize())
                .map_or(&[][..], Vec::as_slice);
            for &term_idx in owners {
                if let Some(hit) = hits.get_mut(term_idx) {
                    if !*hit {
                        *hit = true;
                        remaining = remaining.saturating_sub(1);
                    }
                }
            }
            if remaining == 0 {
                break;
            }
        }

        hits.iter()
            .enumerate()
            .filter_map(|(idx, hit)| hit.then_some(idx))
            .collect()
    }

    /// Classifies one block; blocks without any key term produce no record.
    pub fn match_block(&self, block: TextBlock<'_>) -> Option<MatchRecord> {
        let matched = self.matched_term_indices(block.content);
        if matched.is_empty() {
            return None;
        }

        let matched_key_terms: Vec<String> = matched
            .iter()
            .filter_map(|idx| self.terms.get(*idx).cloned())
            .collect();

        Some(MatchRecord {
            text: block.content.to_string(),
            location: block.location,
            pid: block.pid.to_string(),
            matched_key_terms_count: matched_key_terms.len(),
            matched_key_terms,
        })
    }

    /// Scans a corpus in order and returns the sparse list of matching blocks.
    pub fn scan<'a, I>(&self, blocks: I) -> Vec<MatchRecord>
    where
        I: IntoIterator<Item = TextBlock<'a>>,
    {
        blocks
            .into_iter()
            .filter_map(|block| self.match_block(block))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use common::types::{text_blocks, CorpusBlock};

    use super::*;

    fn corpus(texts: &[&str]) -> Vec<CorpusBlock> {
        texts
            .iter()
            .map(|text| CorpusBlock {
                content: Some((*text).to_string()),
                pid: String::new(),
            })
            .collect()
    }

    fn key_terms(terms: &[&str], synonyms: &[(&str, &[&str])]) -> KeyTermSet {
        let terms: Vec<String> = terms.iter().map(|term| (*term).to_string()).collect();
        let synonyms: BTreeMap<String, Vec<String>> = synonyms
            .iter()
            .map(|(term, variants)| {
                (
                    (*term).to_string(),
                    variants.iter().map(|variant| (*variant).to_string()).collect(),
                )
            })
            .collect();
        KeyTermSet::new(&terms, &synonyms)
    }

    #[test]
    fn single_term_block_is_recorded() {
        let matcher = KeywordMatcher::new(&key_terms(&["ataxia"], &[])).expect("matcher");
        let blocks = corpus(&["Freidreich's ataxia is genetic."]);

        let records = matcher.scan(text_blocks(&blocks));

        assert_eq!(
            records,
            vec![MatchRecord {
                text: "Freidreich's ataxia is genetic.".into(),
                location: 0,
                pid: String::new(),
                matched_key_terms: vec!["ataxia".into()],
                matched_key_terms_count: 1,
            }]
        );
    }

    #[test]
    fn synonym_hits_are_attributed_to_the_parent_term() {
        let matcher = KeywordMatcher::new(&key_terms(
            &["Friedreich ataxia", "frataxin"],
            &[("Friedreich ataxia", &["FRDA"]), ("frataxin", &["FXN"])],
        ))
        .expect("matcher");
        let blocks = corpus(&[
            "FRDA is caused by GAA expansions in FXN.",
            "Nothing relevant here.",
            "frataxin deficiency",
        ]);

        let records = matcher.scan(text_blocks(&blocks));

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].matched_key_terms,
            vec!["Friedreich ataxia".to_string(), "frataxin".to_string()]
        );
        assert_eq!(records[0].matched_key_terms_count, 2);
        assert_eq!(records[1].location, 2);
        assert_eq!(records[1].matched_key_terms, vec!["frataxin".to_string()]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let matcher = KeywordMatcher::new(&key_terms(&["GAA"], &[])).expect("matcher");
        assert!(matcher.matched_term_indices("a gaa repeat").is_empty());
        assert_eq!(matcher.matched_term_indices("a GAA repeat"), vec![0]);
    }

    #[test]
    fn nested_terms_are_both_found() {
        let matcher =
            KeywordMatcher::new(&key_terms(&["ataxia", "Friedreich's ataxia"], &[])).expect("matcher");
        assert_eq!(
            matcher.matched_term_indices("Friedreich's ataxia onset"),
            vec![0, 1]
        );
    }

    #[test]
    fn shared_synonym_credits_every_owner() {
        let matcher = KeywordMatcher::new(&key_terms(
            &["iron", "mitochondria"],
            &[("iron", &["Fe-S cluster"]), ("mitochondria", &["Fe-S cluster"])],
        ))
        .expect("matcher");
        assert_eq!(
            matcher.matched_term_indices("assembly of the Fe-S cluster"),
            vec![0, 1]
        );
    }

    #[test]
    fn every_term_and_synonym_is_found_verbatim() {
        let set = key_terms(
            &["alpha", "beta", "gamma"],
            &[("alpha", &["A1", "first letter"]), ("gamma", &["G-3"])],
        );
        let matcher = KeywordMatcher::new(&set).expect("matcher");

        for (term_idx, form) in set.surface_forms() {
            let text = format!("prefix {form} suffix");
            let matched = matcher.matched_term_indices(&text);
            assert!(
                matched.contains(&term_idx),
                "{form} should credit term {term_idx}, got {matched:?}"
            );
        }
    }

    #[test]
    fn empty_term_set_matches_nothing() {
        let matcher = KeywordMatcher::new(&KeyTermSet::default()).expect("matcher");
        let blocks = corpus(&["anything at all"]);
        assert!(matcher.scan(text_blocks(&blocks)).is_empty());
    }
}
