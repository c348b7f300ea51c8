use serde::{Deserialize, Serialize};

/// A gate survivor and the composite score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedText {
    pub text: String,
    pub score: f64,
}

/// A candidate's independent answer and how well the candidate supports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportScore {
    pub text: String,
    pub individual_answer: String,
    pub original_score: f64,
    pub support_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSupportText {
    pub text: String,
    pub individual_answer: String,
    pub support_score: u8,
}

/// Final answer package for one question; every intermediate set is kept for audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub final_context: String,
    pub top_individual_answers: String,
    pub selected_texts: Vec<SelectedText>,
    pub support_scores: Vec<SupportScore>,
    pub top_support_texts: Vec<TopSupportText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerRecord {
    pub fn empty(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Sentinel recorded at a question's slot when its processing failed.
    pub fn failed(question: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
