use std::fmt;

use serde::{Deserialize, Serialize};

use super::{lenient_score, lenient_string};

/// A semantic-retrieval hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ctx {
    #[serde(default, deserialize_with = "lenient_string")]
    pub pid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: f64,
}

/// Ranked hits one retrieval channel produced for one question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtxList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub ctxs: Vec<Ctx>,
}

/// The channel that surfaced a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    KeywordMatch,
    TextByQuery,
    AbstractByQuery,
    TextByVirtualAnswer,
    AbstractByVirtualAnswer,
}

impl EvidenceSource {
    pub const ALL: [Self; 5] = [
        Self::KeywordMatch,
        Self::TextByQuery,
        Self::AbstractByQuery,
        Self::TextByVirtualAnswer,
        Self::AbstractByVirtualAnswer,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::KeywordMatch => "keyword_match",
            Self::TextByQuery => "text_by_query",
            Self::AbstractByQuery => "abstract_by_query",
            Self::TextByVirtualAnswer => "text_by_virtual_answer",
            Self::AbstractByVirtualAnswer => "abstract_by_virtual_answer",
        }
    }

    /// Keyword hits carry no similarity score.
    pub const fn is_scored(self) -> bool {
        !matches!(self, Self::KeywordMatch)
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One block of a document's aggregated evidence with its composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredText {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default)]
    pub sources: Vec<EvidenceSource>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEvidence {
    #[serde(rename = "pid", alias = "document_id", default, deserialize_with = "lenient_string")]
    pub document_id: String,
    #[serde(default)]
    pub texts: Vec<ScoredText>,
}

/// Aggregated evidence for one question, one entry per document.
pub type QuestionEvidence = Vec<DocumentEvidence>;
