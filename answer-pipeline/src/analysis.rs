use common::types::{AnalyzedQuestion, QuestionAnalysis, QuestionRecord};
use tracing::{info, instrument, warn};

use crate::{orchestrator::run_ordered, reasoner::Reasoner};

/// Extracts key terms, synonyms and a virtual answer for every question.
///
/// A question whose analysis fails keeps its slot with an empty analysis.
#[instrument(skip_all, fields(total = questions.len(), concurrency = concurrency))]
pub async fn analyze_questions(
    reasoner: &dyn Reasoner,
    questions: &[QuestionRecord],
    concurrency: usize,
) -> Vec<AnalyzedQuestion> {
    let total = questions.len();
    let mut completed = 0_usize;

    run_ordered(
        questions.iter().collect(),
        concurrency,
        |idx, record: &QuestionRecord| async move {
            let analysis = match reasoner.analyze_question(&record.question).await {
                Ok(analysis) => analysis,
                Err(err) => {
                    warn!(question = idx, error = %err, "question analysis failed; using an empty analysis");
                    QuestionAnalysis::default()
                }
            };
            AnalyzedQuestion {
                question: record.question.clone(),
                analysis,
            }
        },
        |idx, analyzed: &AnalyzedQuestion| {
            completed += 1;
            info!(
                question = idx,
                completed,
                total,
                key_terms = analyzed.analysis.key_terms.len(),
                "question analyzed"
            );
        },
    )
    .await
}
