mod config;
mod context;
mod stages;
mod state;

pub use config::FunnelTuning;
pub use context::{Candidate, SelectionState, SupportedCandidate};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{
    error::AppError,
    types::{AnswerRecord, QuestionEvidence},
};
use tracing::{debug, info};

use self::{
    context::FunnelContext,
    stages::{fuse, gate, rank, score_support, synthesize},
    state::ready,
};
use crate::reasoner::Reasoner;

/// Shrinks a question's scored evidence to a few well-supported blocks and
/// synthesizes the final answer from them.
pub struct SelectionFunnel {
    reasoner: Arc<dyn Reasoner>,
    tuning: FunnelTuning,
}

impl SelectionFunnel {
    pub fn new(reasoner: Arc<dyn Reasoner>, tuning: FunnelTuning) -> Self {
        Self { reasoner, tuning }
    }

    pub fn tuning(&self) -> &FunnelTuning {
        &self.tuning
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    pub async fn run(
        &self,
        question: &str,
        evidence: &QuestionEvidence,
    ) -> Result<AnswerRecord, AppError> {
        let state = self.select(question, evidence).await?;
        Ok(state.into_record(question))
    }

    /// Runs every stage and returns the working sets instead of the answer record.
    ///
    /// A question without any evidence never reaches the reasoner.
    #[tracing::instrument(skip_all, fields(question = %question))]
    pub async fn select(
        &self,
        question: &str,
        evidence: &QuestionEvidence,
    ) -> Result<SelectionState, AppError> {
        let mut ctx = FunnelContext::new(question, &self.tuning, self.reasoner.as_ref());
        let funnel_started = Instant::now();

        let machine = ready();
        let machine = rank(machine, &mut ctx, evidence).map_err(|err| ctx.abort(err))?;
        if ctx.state.candidates.is_empty() {
            debug!("question has no evidence; returning an empty answer");
            return Ok(ctx.state);
        }

        let stage_start = Instant::now();
        let machine = gate(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let gate_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = score_support(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let score_duration = stage_start.elapsed();

        let machine = fuse(machine, &mut ctx).map_err(|err| ctx.abort(err))?;

        let stage_start = Instant::now();
        let _machine = synthesize(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let synthesize_duration = stage_start.elapsed();

        info!(
            candidates = ctx.state.candidates.len(),
            answerable = ctx.state.answerable_subset.len(),
            fallback = ctx.state.used_fallback,
            supported = ctx.state.supported_subset.len(),
            total_ms = Self::duration_millis(funnel_started.elapsed()),
            gate_ms = Self::duration_millis(gate_duration),
            score_ms = Self::duration_millis(score_duration),
            synthesize_ms = Self::duration_millis(synthesize_duration),
            "selection funnel finished"
        );

        Ok(ctx.state)
    }
}

#[cfg(test)]
mod tests;
