pub mod aggregation;
pub mod keyword;
pub mod scoring;

pub use aggregation::{
    group_by_document, EvidenceAggregator, EvidenceSources, EvidenceUnit, QuestionEvidenceBuilder,
    ScoredEvidence,
};
pub use keyword::{match_question, match_questions, CoverageTuning, KeywordMatcher};
pub use scoring::{sort_by_score_desc, ScoreWeights};
