use common::{error::AppError, types::QuestionEvidence};
use evidence_pipeline::sort_by_score_desc;
use futures::{stream, StreamExt, TryStreamExt};
use state_machines::core::GuardError;
use tracing::{debug, instrument, warn};

use super::{
    context::{Candidate, FunnelContext, SupportedCandidate},
    state::{Fused, FunnelMachine, Gated, Ranked, Ready, Scored, Synthesized},
};

#[instrument(level = "trace", skip_all, fields(question = %ctx.question))]
pub fn rank(
    machine: FunnelMachine<(), Ready>,
    ctx: &mut FunnelContext<'_>,
    evidence: &QuestionEvidence,
) -> Result<FunnelMachine<(), Ranked>, AppError> {
    let mut candidates: Vec<Candidate> = evidence
        .iter()
        .flat_map(|document| {
            document.texts.iter().map(|text| Candidate {
                document_id: document.document_id.clone(),
                text: text.text.clone(),
                sources: text.sources.clone(),
                score: text.score,
            })
        })
        .collect();
    sort_by_score_desc(&mut candidates, |candidate| candidate.score);

    debug!(
        documents = evidence.len(),
        candidates = candidates.len(),
        "ranked candidates"
    );
    ctx.state.candidates = candidates;

    machine
        .rank()
        .map_err(|(_, guard)| map_guard_error("rank", &guard))
}

/// Asks the reasoner about each candidate in rank order until enough pass.
#[instrument(level = "trace", skip_all, fields(question = %ctx.question))]
pub async fn gate(
    machine: FunnelMachine<(), Ranked>,
    ctx: &mut FunnelContext<'_>,
) -> Result<FunnelMachine<(), Gated>, AppError> {
    let tuning = ctx.tuning;
    let mut answerable = Vec::new();
    let mut asked = 0_usize;

    for candidate in &ctx.state.candidates {
        if answerable.len() >= tuning.max_answerable {
            break;
        }
        asked += 1;
        match ctx.reasoner.answerable(&candidate.text, ctx.question).await {
            Ok(true) => answerable.push(candidate.clone()),
            Ok(false) => {}
            Err(err) if tuning.gate_errors_as_rejections => {
                warn!(error = %err, "answerability check failed; treating as rejection");
            }
            Err(err) => return Err(err),
        }
    }

    if answerable.is_empty() && !ctx.state.candidates.is_empty() {
        answerable = ctx
            .state
            .candidates
            .iter()
            .take(tuning.fallback_take)
            .cloned()
            .collect();
        ctx.state.used_fallback = true;
        debug!(taken = answerable.len(), "no candidate passed the gate; using top ranked");
    }

    debug!(asked, answerable = answerable.len(), "answerability gate done");
    ctx.state.answerable_subset = answerable;

    machine
        .gate()
        .map_err(|(_, guard)| map_guard_error("gate", &guard))
}

/// Generates an answer from each gate survivor alone, then scores the survivor against it.
#[instrument(level = "trace", skip_all, fields(question = %ctx.question))]
pub async fn score_support(
    machine: FunnelMachine<(), Gated>,
    ctx: &mut FunnelContext<'_>,
) -> Result<FunnelMachine<(), Scored>, AppError> {
    let reasoner = ctx.reasoner;
    let question = ctx.question;
    let concurrency = ctx.tuning.candidate_concurrency.max(1);

    let scored: Vec<SupportedCandidate> = stream::iter(ctx.state.answerable_subset.iter().cloned())
        .map(|candidate| async move {
            let individual_answer = reasoner.generate_answer(&candidate.text, question).await?;
            let support_score = reasoner
                .support_score(&candidate.text, question, &individual_answer)
                .await?;
            Ok::<_, AppError>(SupportedCandidate {
                candidate,
                individual_answer,
                support_score,
            })
        })
        .buffered(concurrency)
        .try_collect()
        .await?;

    debug!(scored = scored.len(), "support scoring done");
    ctx.state.scored = scored;

    machine
        .score()
        .map_err(|(_, guard)| map_guard_error("score", &guard))
}

#[instrument(level = "trace", skip_all, fields(question = %ctx.question))]
pub fn fuse(
    machine: FunnelMachine<(), Scored>,
    ctx: &mut FunnelContext<'_>,
) -> Result<FunnelMachine<(), Fused>, AppError> {
    let tuning = ctx.tuning;
    let mut supported: Vec<SupportedCandidate> = ctx
        .state
        .scored
        .iter()
        .filter(|scored| scored.support_score > tuning.support_threshold)
        .cloned()
        .collect();
    // Stable, so equal support keeps rank order.
    supported.sort_by(|a, b| b.support_score.cmp(&a.support_score));
    supported.truncate(tuning.max_supported);

    ctx.state.final_context = supported
        .iter()
        .map(|supported| supported.candidate.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    ctx.state.top_individual_answers = supported
        .iter()
        .map(|supported| supported.individual_answer.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    debug!(supported = supported.len(), "support fusion done");
    ctx.state.supported_subset = supported;

    machine
        .fuse()
        .map_err(|(_, guard)| map_guard_error("fuse", &guard))
}

#[instrument(level = "trace", skip_all, fields(question = %ctx.question))]
pub async fn synthesize(
    machine: FunnelMachine<(), Fused>,
    ctx: &mut FunnelContext<'_>,
) -> Result<FunnelMachine<(), Synthesized>, AppError> {
    if ctx.state.supported_subset.is_empty() && !ctx.tuning.synthesize_when_unsupported {
        debug!("no supported candidates; skipping synthesis");
        ctx.state.final_answer = String::new();
    } else {
        ctx.state.final_answer = ctx
            .reasoner
            .synthesize(&ctx.state.top_individual_answers, ctx.question)
            .await?;
    }

    machine
        .synthesize()
        .map_err(|(_, guard)| map_guard_error("synthesize", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid selection funnel transition during {event}: {guard:?}"
    ))
}
