use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use common::{error::AppError, types::QuestionAnalysis, utils::config::AppConfig};
use tracing::{debug, instrument};

use super::{
    parsing::{parse_answerable, parse_question_analysis, parse_support_score},
    Reasoner,
};
use crate::utils::llm_instructions::{
    answerability_prompt, individual_answer_prompt, question_analysis_prompt,
    support_score_prompt, synthesis_prompt, ANSWERABILITY_SYSTEM_MESSAGE,
    INDIVIDUAL_ANSWER_SYSTEM_MESSAGE, QUESTION_ANALYSIS_SYSTEM_MESSAGE,
    SUPPORT_SCORE_SYSTEM_MESSAGE, SYNTHESIS_SYSTEM_MESSAGE,
};

/// Reasoner backed by any OpenAI-compatible chat completion endpoint.
pub struct OpenAiReasoner {
    client: Arc<Client<OpenAIConfig>>,
    reasoning_model: String,
    synthesis_model: String,
}

impl OpenAiReasoner {
    pub fn new(
        client: Arc<Client<OpenAIConfig>>,
        reasoning_model: impl Into<String>,
        synthesis_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            reasoning_model: reasoning_model.into(),
            synthesis_model: synthesis_model.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));
        Self::new(client, &config.reasoning_model, &config.synthesis_model)
    }

    #[instrument(level = "trace", skip_all, fields(model = %model))]
    async fn complete(
        &self,
        model: &str,
        system_message: &str,
        user_message: String,
    ) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages([
                ChatCompletionRequestSystemMessage::from(system_message).into(),
                ChatCompletionRequestUserMessage::from(user_message).into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or(AppError::LLMParsing(
                "No content found in LLM response".into(),
            ))?;

        debug!(reply_chars = content.chars().count(), "reasoner replied");
        Ok(content.clone())
    }
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    async fn answerable(&self, context: &str, question: &str) -> Result<bool, AppError> {
        let reply = self
            .complete(
                &self.reasoning_model,
                ANSWERABILITY_SYSTEM_MESSAGE,
                answerability_prompt(context, question),
            )
            .await?;
        Ok(parse_answerable(&reply))
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String, AppError> {
        self.complete(
            &self.reasoning_model,
            INDIVIDUAL_ANSWER_SYSTEM_MESSAGE,
            individual_answer_prompt(context, question),
        )
        .await
    }

    async fn support_score(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<u8, AppError> {
        let reply = self
            .complete(
                &self.reasoning_model,
                SUPPORT_SCORE_SYSTEM_MESSAGE,
                support_score_prompt(context, question, answer),
            )
            .await?;
        Ok(parse_support_score(&reply))
    }

    async fn synthesize(&self, answers: &str, question: &str) -> Result<String, AppError> {
        self.complete(
            &self.synthesis_model,
            SYNTHESIS_SYSTEM_MESSAGE,
            synthesis_prompt(answers, question),
        )
        .await
    }

    async fn analyze_question(&self, question: &str) -> Result<QuestionAnalysis, AppError> {
        let reply = self
            .complete(
                &self.reasoning_model,
                QUESTION_ANALYSIS_SYSTEM_MESSAGE,
                question_analysis_prompt(question),
            )
            .await?;
        parse_question_analysis(&reply)
    }
}
