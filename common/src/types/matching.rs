use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient_string;

/// A corpus block together with the key terms it mentions.
///
/// Equality and hashing are structural over every field, which is what the
/// coverage selector deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default)]
    pub location: usize,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub pid: String,
    /// Matched key terms in key-term order, never synonym variants.
    #[serde(default)]
    pub matched_key_terms: Vec<String>,
    #[serde(default)]
    pub matched_key_terms_count: usize,
}

/// Keyword-channel output for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedQuestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    /// Position of the question in the analysed input. Questions without matches
    /// are left out of the keyword output, so this is what lines an entry up
    /// with the retrieval channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    #[serde(default)]
    pub key_terms: Vec<String>,
    #[serde(default, alias = "key_terms synonyms")]
    pub key_terms_synonyms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub matched_texts: Vec<MatchRecord>,
}
