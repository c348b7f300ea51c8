pub static ANSWERABILITY_SYSTEM_MESSAGE: &str = "Evaluate if the context can answer the question.";

pub static INDIVIDUAL_ANSWER_SYSTEM_MESSAGE: &str =
    "You need to answer question based on the context.";

pub static SUPPORT_SCORE_SYSTEM_MESSAGE: &str = "Rate the support level for the answer.";

pub static SYNTHESIS_SYSTEM_MESSAGE: &str =
    "You need to answer concisely by integrating multiple answers.";

pub static QUESTION_ANALYSIS_SYSTEM_MESSAGE: &str = r#"Based on the given question, identify the key terms in the question.
Key terms are the entities, subjects or objects the question is about. For example, in the question 'What is the genetic cause of Freidreich's ataxia?', the key term is 'Freidreich's ataxia'.
Generate related synonyms for every key term to expand the query vocabulary.
Additionally, write a plausible virtual answer that could hypothetically address the question, even if it is not grounded in actual data.
Respond with JSON only, in the following format:
{
    "key_terms": ["key_term_1", "key_term_2"],
    "key_terms synonyms": {
        "key_term_1": ["synonym_1", "synonym_2"],
        "key_term_2": ["synonym_1", "synonym_2"]
    },
    "virtual_answer": "Your generated virtual answer here."
}"#;

pub fn answerability_prompt(context: &str, question: &str) -> String {
    format!(
        "Context:\n{context}\n\nQuestion: {question}\n\nIf the text excerpt allows the question to be correctly answered as specified, respond with 'yes'. Otherwise, respond 'no'."
    )
}

pub fn individual_answer_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}

pub fn support_score_prompt(context: &str, question: &str, answer: &str) -> String {
    format!(
        "Context:\n{context}\n\nQuestion: {question}\n\nAnswer: {answer}\n\nScore how well the context supports the answer to the question. A fully supporting context scores 100 points, while one that is unrelated or contradicts the answer scores 0 points. Partial support scores in between. Only output the final score."
    )
}

pub fn synthesis_prompt(answers: &str, question: &str) -> String {
    format!(
        "Multiple Answers:\n{answers}\n\nQuestion: {question}\n\nIntegrate the answers above to respond to the question. Answer concisely in one or two sentences."
    )
}

pub fn question_analysis_prompt(question: &str) -> String {
    format!("\nThe question is: {question}")
}
