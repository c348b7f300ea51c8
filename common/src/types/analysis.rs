use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::lenient_string;

/// A question as it appears in the input dataset; extra fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
}

/// Key terms, their synonyms and a hypothetical answer used as an alternate query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    #[serde(default)]
    pub key_terms: Vec<String>,
    #[serde(
        default,
        rename = "key_terms synonyms",
        alias = "key_terms_synonyms"
    )]
    pub key_terms_synonyms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub virtual_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedQuestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default)]
    pub analysis: QuestionAnalysis,
}

/// Ordered, unique key terms, each owning its surface forms.
///
/// The first surface form of every term is the term itself, so a term always
/// matches itself even when no synonyms were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyTermSet {
    terms: Vec<String>,
    variants: Vec<Vec<String>>,
}

impl KeyTermSet {
    pub fn new(terms: &[String], synonyms: &BTreeMap<String, Vec<String>>) -> Self {
        let mut seen_terms = HashSet::new();
        let mut set = Self::default();

        for term in terms {
            if !seen_terms.insert(term.as_str()) {
                continue;
            }
            let mut seen_variants: HashSet<&str> = HashSet::new();
            let mut variants = Vec::new();
            for variant in std::iter::once(term).chain(synonyms.get(term).into_iter().flatten()) {
                if !variant.is_empty() && seen_variants.insert(variant.as_str()) {
                    variants.push(variant.clone());
                }
            }
            set.terms.push(term.clone());
            set.variants.push(variants);
        }

        set
    }

    pub fn from_analysis(analysis: &QuestionAnalysis) -> Self {
        Self::new(&analysis.key_terms, &analysis.key_terms_synonyms)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Surface forms (term first, then synonyms) paired with the owning term's index.
    pub fn surface_forms(&self) -> impl Iterator<Item = (usize, &str)> {
        self.variants
            .iter()
            .enumerate()
            .flat_map(|(idx, variants)| variants.iter().map(move |variant| (idx, variant.as_str())))
    }
}
