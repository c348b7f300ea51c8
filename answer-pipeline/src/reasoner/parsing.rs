//! Turns free-form model replies into the typed results of [`super::Reasoner`].

use common::{error::AppError, types::QuestionAnalysis};

/// `true` only for an explicit "yes"; anything else is a rejection.
pub fn parse_answerable(reply: &str) -> bool {
    reply
        .trim()
        .trim_end_matches(['.', '!'])
        .trim_end()
        .eq_ignore_ascii_case("yes")
}

/// First run of digits in the reply, clamped to `0..=100`. No digits scores 0.
pub fn parse_support_score(reply: &str) -> u8 {
    let digits: String = reply
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        return 0;
    }

    // Overlong digit runs saturate instead of failing.
    let value = digits.parse::<u64>().unwrap_or(u64::MAX).min(100);
    u8::try_from(value).unwrap_or(100)
}

pub fn parse_question_analysis(reply: &str) -> Result<QuestionAnalysis, AppError> {
    match serde_json::from_str::<QuestionAnalysis>(reply) {
        Ok(analysis) => Ok(analysis),
        Err(_) => serde_json::from_str::<QuestionAnalysis>(strip_code_fence(reply)).map_err(|e| {
            AppError::LLMParsing(format!("Failed to parse LLM response into question analysis: {e}"))
        }),
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
