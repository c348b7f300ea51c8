mod openai;
pub mod parsing;
mod retry;

use async_trait::async_trait;
use common::{error::AppError, types::QuestionAnalysis};

pub use openai::OpenAiReasoner;
pub use retry::RetryingReasoner;

/// The external language service behind every judgement the pipeline makes.
///
/// Each operation is one stateless request/response. Implementations must be
/// safe to call concurrently from every worker of the pool.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Whether `context` alone allows `question` to be answered.
    async fn answerable(&self, context: &str, question: &str) -> Result<bool, AppError>;

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String, AppError>;

    /// How well `context` supports `answer` to `question`, in `0..=100`.
    async fn support_score(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<u8, AppError>;

    async fn synthesize(&self, answers: &str, question: &str) -> Result<String, AppError>;

    async fn analyze_question(&self, question: &str) -> Result<QuestionAnalysis, AppError>;
}
