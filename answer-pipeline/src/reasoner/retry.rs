use std::{sync::Arc, time::Duration};

use async_openai::error::OpenAIError;
use async_trait::async_trait;
use common::{error::AppError, types::QuestionAnalysis};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::warn;

use super::Reasoner;

const MAX_BACKOFF_SECS: u64 = 30;

/// Retries transport failures of an inner [`Reasoner`] with jittered exponential backoff.
///
/// A call is attempted once and then retried up to `max_retries` times.
/// Replies that arrived but could not be parsed are returned as-is.
pub struct RetryingReasoner {
    inner: Arc<dyn Reasoner>,
    max_retries: usize,
    base_delay_ms: u64,
}

impl RetryingReasoner {
    pub fn new(inner: Arc<dyn Reasoner>, max_retries: usize, base_delay_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            base_delay_ms: base_delay_ms.max(1),
        }
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(self.base_delay_ms)
            .max_delay(Duration::from_secs(MAX_BACKOFF_SECS))
            .map(jitter)
            .take(self.max_retries)
    }
}

fn is_transient(err: &AppError) -> bool {
    let transient = matches!(
        err,
        AppError::Reasoner(_)
            | AppError::OpenAI(OpenAIError::Reqwest(_) | OpenAIError::ApiError(_))
    );
    if transient {
        warn!(error = %err, "transient reasoner failure");
    }
    transient
}

#[async_trait]
impl Reasoner for RetryingReasoner {
    async fn answerable(&self, context: &str, question: &str) -> Result<bool, AppError> {
        RetryIf::spawn(
            self.strategy(),
            || self.inner.answerable(context, question),
            is_transient,
        )
        .await
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String, AppError> {
        RetryIf::spawn(
            self.strategy(),
            || self.inner.generate_answer(context, question),
            is_transient,
        )
        .await
    }

    async fn support_score(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<u8, AppError> {
        RetryIf::spawn(
            self.strategy(),
            || self.inner.support_score(context, question, answer),
            is_transient,
        )
        .await
    }

    async fn synthesize(&self, answers: &str, question: &str) -> Result<String, AppError> {
        RetryIf::spawn(
            self.strategy(),
            || self.inner.synthesize(answers, question),
            is_transient,
        )
        .await
    }

    async fn analyze_question(&self, question: &str) -> Result<QuestionAnalysis, AppError> {
        RetryIf::spawn(
            self.strategy(),
            || self.inner.analyze_question(question),
            is_transient,
        )
        .await
    }
}
