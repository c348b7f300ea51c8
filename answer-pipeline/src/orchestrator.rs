use std::{future::Future, sync::Arc};

use common::{
    error::AppError,
    types::{AnswerRecord, QuestionEvidence},
};
use futures::{stream, StreamExt};
use tracing::{info, instrument, warn};

use crate::pipeline::SelectionFunnel;

/// Runs `work` over `items` with at most `concurrency` in flight.
///
/// Results land in a slot per input position, so the output order is the input
/// order no matter which item finishes first. `on_done` sees every completion.
pub async fn run_ordered<T, R, W, Fut, D>(
    items: Vec<T>,
    concurrency: usize,
    work: W,
    mut on_done: D,
) -> Vec<R>
where
    W: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
    D: FnMut(usize, &R),
{
    let total = items.len();
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completions = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let job = work(idx, item);
            async move { (idx, job.await) }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((idx, result)) = completions.next().await {
        on_done(idx, &result);
        if let Some(slot) = slots.get_mut(idx) {
            *slot = Some(result);
        }
    }

    slots.into_iter().flatten().collect()
}

/// Fans the selection funnel out over every question of a run.
pub struct PipelineOrchestrator {
    funnel: Arc<SelectionFunnel>,
    concurrency: usize,
}

impl PipelineOrchestrator {
    pub fn new(funnel: Arc<SelectionFunnel>, concurrency: usize) -> Self {
        Self {
            funnel,
            concurrency: concurrency.max(1),
        }
    }

    /// Produces one record per evidence entry; question texts are matched by position.
    ///
    /// A question that fails keeps its slot with the error recorded.
    #[instrument(skip_all, fields(total = evidence.len(), concurrency = self.concurrency))]
    pub async fn run(&self, questions: &[String], evidence: &[QuestionEvidence]) -> Vec<AnswerRecord> {
        let total = evidence.len();
        if questions.len() != total {
            warn!(
                questions = questions.len(),
                evidence = total,
                "question and evidence counts differ; questions are matched by position"
            );
        }

        let mut completed = 0_usize;
        let mut failed = 0_usize;
        let funnel = &self.funnel;

        run_ordered(
            evidence.iter().collect(),
            self.concurrency,
            |idx, question_evidence| {
                let question = questions.get(idx).cloned().unwrap_or_default();
                async move {
                    match funnel.run(&question, question_evidence).await {
                        Ok(record) => record,
                        Err(err) => Self::failed_record(idx, question, &err),
                    }
                }
            },
            |idx, record: &AnswerRecord| {
                completed += 1;
                if record.is_failed() {
                    failed += 1;
                }
                info!(question = idx, completed, total, failed, "question processed");
            },
        )
        .await
    }

    fn failed_record(idx: usize, question: String, err: &AppError) -> AnswerRecord {
        warn!(question = idx, error = %err, "question failed; recording error at its slot");
        AnswerRecord::failed(question, err.to_string())
    }
}
