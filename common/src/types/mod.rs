mod analysis;
mod answer;
mod corpus;
mod evidence;
mod matching;

pub use analysis::{AnalyzedQuestion, KeyTermSet, QuestionAnalysis, QuestionRecord};
pub use answer::{AnswerRecord, SelectedText, SupportScore, TopSupportText};
pub use corpus::{text_blocks, CorpusBlock, TextBlock};
pub use evidence::{Ctx, CtxList, DocumentEvidence, EvidenceSource, QuestionEvidence, ScoredText};
pub use matching::{MatchRecord, MatchedQuestion};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// Upstream producers are heterogeneous: a missing or mistyped field degrades to
// an empty contribution instead of rejecting the whole artifact.

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

pub(crate) fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
