pub mod coverage;
pub mod matcher;

use common::{
    error::AppError,
    types::{text_blocks, AnalyzedQuestion, CorpusBlock, KeyTermSet, MatchedQuestion},
};
use tracing::{debug, info, instrument};

pub use coverage::{select_representatives, CoverageTuning};
pub use matcher::KeywordMatcher;

/// Keyword channel for one question: scan the corpus, then keep representatives.
///
/// Returns `None` when no block mentions any key term.
#[instrument(level = "debug", skip_all, fields(key_terms = question.analysis.key_terms.len()))]
pub fn match_question(
    question: &AnalyzedQuestion,
    corpus: &[CorpusBlock],
    tuning: &CoverageTuning,
) -> Result<Option<MatchedQuestion>, AppError> {
    let key_terms = KeyTermSet::from_analysis(&question.analysis);
    if key_terms.is_empty() {
        debug!("question has no key terms");
        return Ok(None);
    }

    let matcher = KeywordMatcher::new(&key_terms)?;
    let records = matcher.scan(text_blocks(corpus));
    let matched_texts = select_representatives(&key_terms, &records, tuning);
    debug!(
        matched_blocks = records.len(),
        selected = matched_texts.len(),
        "keyword channel done"
    );

    if matched_texts.is_empty() {
        return Ok(None);
    }

    Ok(Some(MatchedQuestion {
        question: question.question.clone(),
        question_index: None,
        key_terms: key_terms.terms().to_vec(),
        key_terms_synonyms: question.analysis.key_terms_synonyms.clone(),
        matched_texts,
    }))
}

/// Runs the keyword channel over every question, omitting questions without matches.
///
/// Every entry records the position of its question in `questions`.
pub fn match_questions(
    questions: &[AnalyzedQuestion],
    corpus: &[CorpusBlock],
    tuning: &CoverageTuning,
) -> Result<Vec<MatchedQuestion>, AppError> {
    let mut matched = Vec::with_capacity(questions.len());
    for (index, question) in questions.iter().enumerate() {
        if let Some(mut result) = match_question(question, corpus, tuning)? {
            result.question_index = Some(index);
            matched.push(result);
        }
    }

    info!(
        questions = questions.len(),
        with_matches = matched.len(),
        corpus_blocks = corpus.len(),
        "keyword matching finished"
    );
    Ok(matched)
}
