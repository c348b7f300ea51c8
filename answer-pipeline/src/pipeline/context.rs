use common::{
    error::AppError,
    types::{AnswerRecord, EvidenceSource, SelectedText, SupportScore, TopSupportText},
};
use tracing::error;

use super::config::FunnelTuning;
use crate::reasoner::Reasoner;

/// One block of evidence competing for a place in the final context.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub document_id: String,
    pub text: String,
    pub sources: Vec<EvidenceSource>,
    pub score: f64,
}

/// A gate survivor with the answer it supports on its own and how well it does.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportedCandidate {
    pub candidate: Candidate,
    pub individual_answer: String,
    pub support_score: u8,
}

/// The funnel's working sets for one question.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub candidates: Vec<Candidate>,
    pub answerable_subset: Vec<Candidate>,
    /// Set when nothing passed the gate and the top-ranked candidates were taken instead.
    pub used_fallback: bool,
    pub scored: Vec<SupportedCandidate>,
    pub supported_subset: Vec<SupportedCandidate>,
    pub final_context: String,
    pub top_individual_answers: String,
    pub final_answer: String,
}

impl SelectionState {
    pub fn into_record(self, question: &str) -> AnswerRecord {
        AnswerRecord {
            question: question.to_string(),
            answer: self.final_answer,
            final_context: self.final_context,
            top_individual_answers: self.top_individual_answers,
            selected_texts: self
                .answerable_subset
                .into_iter()
                .map(|candidate| SelectedText {
                    text: candidate.text,
                    score: candidate.score,
                })
                .collect(),
            support_scores: self
                .scored
                .into_iter()
                .map(|scored| SupportScore {
                    text: scored.candidate.text,
                    individual_answer: scored.individual_answer,
                    original_score: scored.candidate.score,
                    support_score: scored.support_score,
                })
                .collect(),
            top_support_texts: self
                .supported_subset
                .into_iter()
                .map(|supported| TopSupportText {
                    text: supported.candidate.text,
                    individual_answer: supported.individual_answer,
                    support_score: supported.support_score,
                })
                .collect(),
            error: None,
        }
    }
}

pub struct FunnelContext<'a> {
    pub question: &'a str,
    pub tuning: &'a FunnelTuning,
    pub reasoner: &'a dyn Reasoner,
    pub state: SelectionState,
}

impl<'a> FunnelContext<'a> {
    pub fn new(question: &'a str, tuning: &'a FunnelTuning, reasoner: &'a dyn Reasoner) -> Self {
        Self {
            question,
            tuning,
            reasoner,
            state: SelectionState::default(),
        }
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            question = %self.question,
            candidates = self.state.candidates.len(),
            answerable = self.state.answerable_subset.len(),
            error = %err,
            "selection funnel aborted"
        );
        err
    }
}
