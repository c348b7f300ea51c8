use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use common::{
    error::AppError,
    types::{DocumentEvidence, EvidenceSource, QuestionAnalysis, QuestionEvidence, ScoredText},
};
use tokio::sync::Mutex;

use super::{FunnelTuning, SelectionFunnel};
use crate::reasoner::Reasoner;

const QUESTION: &str = "What is the genetic cause of Friedreich's ataxia?";

#[derive(Default)]
struct MockReasoner {
    answerable_texts: HashSet<String>,
    answer_everything: bool,
    support: HashMap<String, u8>,
    default_support: u8,
    calls: Mutex<Vec<&'static str>>,
    gate_asked: Mutex<Vec<String>>,
    synthesized_from: Mutex<Vec<String>>,
}

impl MockReasoner {
    fn answering(texts: &[&str]) -> Self {
        Self {
            answerable_texts: texts.iter().map(|text| (*text).to_string()).collect(),
            default_support: 80,
            ..Self::default()
        }
    }

    fn answering_all(default_support: u8) -> Self {
        Self {
            answer_everything: true,
            default_support,
            ..Self::default()
        }
    }

    fn with_support(mut self, text: &str, score: u8) -> Self {
        self.support.insert(text.to_string(), score);
        self
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().await.push(call);
    }

    async fn count(&self, call: &'static str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|entry| **entry == call)
            .count()
    }
}

fn answer_for(context: &str) -> String {
    format!("answer<{context}>")
}

#[async_trait]
impl Reasoner for MockReasoner {
    async fn answerable(&self, context: &str, _question: &str) -> Result<bool, AppError> {
        self.record("answerable").await;
        self.gate_asked.lock().await.push(context.to_string());
        Ok(self.answer_everything || self.answerable_texts.contains(context))
    }

    async fn generate_answer(&self, context: &str, _question: &str) -> Result<String, AppError> {
        self.record("generate").await;
        Ok(answer_for(context))
    }

    async fn support_score(
        &self,
        context: &str,
        _question: &str,
        answer: &str,
    ) -> Result<u8, AppError> {
        self.record("support").await;
        assert_eq!(answer, answer_for(context), "score must be conditioned on its own answer");
        Ok(self
            .support
            .get(context)
            .copied()
            .unwrap_or(self.default_support))
    }

    async fn synthesize(&self, answers: &str, _question: &str) -> Result<String, AppError> {
        self.record("synthesize").await;
        self.synthesized_from.lock().await.push(answers.to_string());
        Ok(format!("final<{answers}>"))
    }

    async fn analyze_question(&self, _question: &str) -> Result<QuestionAnalysis, AppError> {
        self.record("analyze").await;
        Ok(QuestionAnalysis::default())
    }
}

/// Reasoner whose answerability checks always fail in transport.
struct FailingGateReasoner {
    inner: MockReasoner,
}

#[async_trait]
impl Reasoner for FailingGateReasoner {
    async fn answerable(&self, _context: &str, _question: &str) -> Result<bool, AppError> {
        self.inner.record("answerable").await;
        Err(AppError::Reasoner("gateway timeout".into()))
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String, AppError> {
        self.inner.generate_answer(context, question).await
    }

    async fn support_score(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<u8, AppError> {
        self.inner.support_score(context, question, answer).await
    }

    async fn synthesize(&self, answers: &str, question: &str) -> Result<String, AppError> {
        self.inner.synthesize(answers, question).await
    }

    async fn analyze_question(&self, question: &str) -> Result<QuestionAnalysis, AppError> {
        self.inner.analyze_question(question).await
    }
}

/// Reasoner that cannot generate answers for one specific block.
struct FailingGenerationReasoner {
    inner: MockReasoner,
    broken_text: String,
}

#[async_trait]
impl Reasoner for FailingGenerationReasoner {
    async fn answerable(&self, context: &str, question: &str) -> Result<bool, AppError> {
        self.inner.answerable(context, question).await
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String, AppError> {
        if context == self.broken_text {
            return Err(AppError::Reasoner("upstream unavailable".into()));
        }
        self.inner.generate_answer(context, question).await
    }

    async fn support_score(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<u8, AppError> {
        self.inner.support_score(context, question, answer).await
    }

    async fn synthesize(&self, answers: &str, question: &str) -> Result<String, AppError> {
        self.inner.synthesize(answers, question).await
    }

    async fn analyze_question(&self, question: &str) -> Result<QuestionAnalysis, AppError> {
        self.inner.analyze_question(question).await
    }
}

/// `count` blocks named `t0..`, spread over two documents, with strictly decreasing scores.
fn ranked_evidence(count: usize) -> QuestionEvidence {
    let mut even = DocumentEvidence {
        document_id: "PMC-even".into(),
        texts: Vec::new(),
    };
    let mut odd = DocumentEvidence {
        document_id: "PMC-odd".into(),
        texts: Vec::new(),
    };
    for idx in 0..count {
        let text = ScoredText {
            text: format!("t{idx}"),
            sources: vec![EvidenceSource::TextByQuery],
            score: 100.0 - idx as f64,
        };
        if idx % 2 == 0 {
            even.texts.push(text);
        } else {
            odd.texts.push(text);
        }
    }
    vec![odd, even]
}

fn texts(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("t{idx}")).collect()
}

fn funnel(reasoner: Arc<dyn Reasoner>, tuning: FunnelTuning) -> SelectionFunnel {
    SelectionFunnel::new(reasoner, tuning)
}

#[tokio::test]
async fn funnel_happy_path_keeps_the_best_supported_blocks() {
    let reasoner = Arc::new(
        MockReasoner::answering(&["t0", "t1", "t2"])
            .with_support("t0", 70)
            .with_support("t1", 40)
            .with_support("t2", 95),
    );
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), FunnelTuning::default());

    let record = funnel
        .run(QUESTION, &ranked_evidence(4))
        .await
        .expect("funnel should succeed");

    assert_eq!(record.question, QUESTION);
    let selected: Vec<&str> = record.selected_texts.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(selected, vec!["t0", "t1", "t2"]);
    assert_eq!(record.support_scores.len(), 3);
    assert_eq!(record.support_scores[1].support_score, 40);
    assert!((record.support_scores[0].original_score - 100.0).abs() < f64::EPSILON);

    let top: Vec<&str> = record.top_support_texts.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(top, vec!["t2", "t0"]);
    assert_eq!(record.final_context, "t2\n\nt0");
    assert_eq!(record.top_individual_answers, "answer<t2> answer<t0>");
    assert_eq!(record.answer, "final<answer<t2> answer<t0>>");
    assert!(record.error.is_none());

    let calls = reasoner.calls.lock().await.clone();
    assert_eq!(&calls[..4], &["answerable"; 4]);
    assert_eq!(
        &calls[4..],
        &["generate", "support", "generate", "support", "generate", "support", "synthesize"]
    );
}

#[tokio::test]
async fn gate_exhausts_the_list_when_few_candidates_pass() {
    let reasoner = Arc::new(MockReasoner::answering(&["t2", "t7", "t11"]));
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), FunnelTuning::default());

    let state = funnel
        .select(QUESTION, &ranked_evidence(12))
        .await
        .expect("funnel should succeed");

    let answerable: Vec<&str> = state
        .answerable_subset
        .iter()
        .map(|candidate| candidate.text.as_str())
        .collect();
    assert_eq!(answerable, vec!["t2", "t7", "t11"]);
    assert!(!state.used_fallback);
    assert_eq!(*reasoner.gate_asked.lock().await, texts(12));
}

#[tokio::test]
async fn gate_stops_once_enough_candidates_pass() {
    let reasoner = Arc::new(MockReasoner::answering_all(90));
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), FunnelTuning::default());

    let state = funnel
        .select(QUESTION, &ranked_evidence(15))
        .await
        .expect("funnel should succeed");

    assert_eq!(state.answerable_subset.len(), 10);
    assert_eq!(reasoner.count("answerable").await, 10);
    assert_eq!(*reasoner.gate_asked.lock().await, texts(10));
    assert_eq!(reasoner.count("generate").await, 10);
    assert_eq!(reasoner.count("support").await, 10);
}

#[tokio::test]
async fn subsets_respect_their_bounds_and_threshold() {
    let mut reasoner = MockReasoner::answering_all(30);
    for (idx, score) in [99_u8, 51, 50, 77, 88, 64, 93, 100, 12, 70].into_iter().enumerate() {
        reasoner = reasoner.with_support(&format!("t{idx}"), score);
    }
    let funnel = funnel(Arc::new(reasoner), FunnelTuning::default());

    let state = funnel
        .select(QUESTION, &ranked_evidence(14))
        .await
        .expect("funnel should succeed");

    assert!(state.answerable_subset.len() <= 10);
    assert!(state.supported_subset.len() <= 5);
    assert!(state
        .supported_subset
        .iter()
        .all(|supported| supported.support_score > 50));
    let supported: Vec<(&str, u8)> = state
        .supported_subset
        .iter()
        .map(|supported| (supported.candidate.text.as_str(), supported.support_score))
        .collect();
    assert_eq!(
        supported,
        vec![("t7", 100), ("t0", 99), ("t6", 93), ("t4", 88), ("t3", 77)]
    );
}

#[tokio::test]
async fn support_of_exactly_the_threshold_is_rejected() {
    let reasoner = Arc::new(MockReasoner::answering(&["t0", "t1"]).with_support("t0", 50).with_support("t1", 51));
    let funnel = funnel(reasoner, FunnelTuning::default());

    let state = funnel
        .select(QUESTION, &ranked_evidence(2))
        .await
        .expect("funnel should succeed");

    assert_eq!(state.supported_subset.len(), 1);
    assert_eq!(state.supported_subset[0].candidate.text, "t1");
}

#[tokio::test]
async fn empty_gate_falls_back_to_the_top_ranked_candidates() {
    let reasoner = Arc::new(MockReasoner::answering(&[]));
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), FunnelTuning::default());

    let state = funnel
        .select(QUESTION, &ranked_evidence(8))
        .await
        .expect("funnel should succeed");

    let answerable: Vec<&str> = state
        .answerable_subset
        .iter()
        .map(|candidate| candidate.text.as_str())
        .collect();
    assert!(state.used_fallback);
    assert_eq!(answerable, vec!["t0", "t1", "t2", "t3", "t4"]);
    assert_eq!(reasoner.count("answerable").await, 8);
    assert_eq!(reasoner.count("generate").await, 5);
}

#[tokio::test]
async fn unsupported_evidence_still_synthesizes_from_nothing_by_default() {
    let reasoner = Arc::new(MockReasoner::answering_all(50));
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), FunnelTuning::default());

    let record = funnel
        .run(QUESTION, &ranked_evidence(3))
        .await
        .expect("funnel should succeed");

    assert!(record.top_support_texts.is_empty());
    assert_eq!(record.final_context, "");
    assert_eq!(record.top_individual_answers, "");
    assert_eq!(record.answer, "final<>");
    assert_eq!(reasoner.count("synthesize").await, 1);
    assert_eq!(*reasoner.synthesized_from.lock().await, vec![String::new()]);
}

#[tokio::test]
async fn unsupported_evidence_can_skip_synthesis() {
    let reasoner = Arc::new(MockReasoner::answering_all(10));
    let tuning = FunnelTuning {
        synthesize_when_unsupported: false,
        ..FunnelTuning::default()
    };
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), tuning);

    let record = funnel
        .run(QUESTION, &ranked_evidence(3))
        .await
        .expect("funnel should succeed");

    assert!(record.top_support_texts.is_empty());
    assert_eq!(record.answer, "");
    assert_eq!(record.support_scores.len(), 3);
    assert_eq!(reasoner.count("synthesize").await, 0);
}

#[tokio::test]
async fn question_without_evidence_never_calls_the_reasoner() {
    let reasoner = Arc::new(MockReasoner::answering_all(90));
    let funnel = funnel(Arc::<MockReasoner>::clone(&reasoner), FunnelTuning::default());

    let record = funnel
        .run(QUESTION, &Vec::new())
        .await
        .expect("empty evidence is not an error");

    assert_eq!(record.question, QUESTION);
    assert_eq!(record.answer, "");
    assert!(record.selected_texts.is_empty());
    assert!(reasoner.calls.lock().await.is_empty());
}

#[tokio::test]
async fn gate_transport_errors_count_as_rejections() {
    let reasoner = Arc::new(FailingGateReasoner {
        inner: MockReasoner::answering_all(90),
    });
    let funnel = funnel(Arc::<FailingGateReasoner>::clone(&reasoner), FunnelTuning::default());

    let state = funnel
        .select(QUESTION, &ranked_evidence(7))
        .await
        .expect("gate errors are tolerated");

    assert!(state.used_fallback);
    assert_eq!(state.answerable_subset.len(), 5);
    assert_eq!(state.supported_subset.len(), 5);
    assert_eq!(reasoner.inner.count("answerable").await, 7);
}

#[tokio::test]
async fn gate_transport_errors_can_be_fatal() {
    let reasoner = Arc::new(FailingGateReasoner {
        inner: MockReasoner::answering_all(90),
    });
    let tuning = FunnelTuning {
        gate_errors_as_rejections: false,
        ..FunnelTuning::default()
    };
    let funnel = funnel(Arc::<FailingGateReasoner>::clone(&reasoner), tuning);

    let result = funnel.select(QUESTION, &ranked_evidence(7)).await;

    assert!(matches!(result, Err(AppError::Reasoner(_))));
    assert_eq!(reasoner.inner.count("answerable").await, 1);
    assert_eq!(reasoner.inner.count("generate").await, 0);
}

#[tokio::test]
async fn generation_failure_aborts_the_question() {
    let reasoner = Arc::new(FailingGenerationReasoner {
        inner: MockReasoner::answering_all(90),
        broken_text: "t1".into(),
    });
    let funnel = funnel(Arc::<FailingGenerationReasoner>::clone(&reasoner), FunnelTuning::default());

    let result = funnel.run(QUESTION, &ranked_evidence(3)).await;

    assert!(matches!(result, Err(AppError::Reasoner(_))));
    assert_eq!(reasoner.inner.count("synthesize").await, 0);
}

#[tokio::test]
async fn concurrent_candidate_scoring_keeps_rank_order() {
    let sequential = funnel(
        Arc::new(MockReasoner::answering_all(75).with_support("t3", 95)),
        FunnelTuning::default(),
    )
    .run(QUESTION, &ranked_evidence(9))
    .await
    .expect("sequential run");

    let concurrent = funnel(
        Arc::new(MockReasoner::answering_all(75).with_support("t3", 95)),
        FunnelTuning {
            candidate_concurrency: 4,
            ..FunnelTuning::default()
        },
    )
    .run(QUESTION, &ranked_evidence(9))
    .await
    .expect("concurrent run");

    assert_eq!(sequential, concurrent);
    assert_eq!(concurrent.top_support_texts[0].text, "t3");
}

#[tokio::test]
async fn equal_scores_keep_their_input_order() {
    let evidence = vec![
        DocumentEvidence {
            document_id: "A".into(),
            texts: vec![
                ScoredText {
                    text: "a1".into(),
                    sources: vec![EvidenceSource::KeywordMatch],
                    score: 0.7,
                },
                ScoredText {
                    text: "a2".into(),
                    sources: vec![EvidenceSource::KeywordMatch],
                    score: 1.5,
                },
            ],
        },
        DocumentEvidence {
            document_id: "B".into(),
            texts: vec![ScoredText {
                text: "b1".into(),
                sources: vec![EvidenceSource::AbstractByQuery],
                score: 0.7,
            }],
        },
    ];
    let reasoner = Arc::new(MockReasoner::answering(&[]));
    let funnel = funnel(reasoner, FunnelTuning::default());

    let state = funnel.select(QUESTION, &evidence).await.expect("funnel");

    let ranked: Vec<(&str, &str)> = state
        .candidates
        .iter()
        .map(|candidate| (candidate.document_id.as_str(), candidate.text.as_str()))
        .collect();
    assert_eq!(ranked, vec![("A", "a2"), ("A", "a1"), ("B", "b1")]);
}
