use std::collections::{BTreeSet, HashMap};

use common::{
    error::AppError,
    types::{CtxList, DocumentEvidence, EvidenceSource, MatchedQuestion, QuestionEvidence, ScoredText},
};
use tracing::{debug, info, instrument};

use crate::scoring::ScoreWeights;

/// The five evidence channels, each aligned by question position.
///
/// Lists may differ in length; a question missing from a channel simply gets
/// nothing from it. Keyword entries carrying a `question_index` are placed by
/// that index instead of their position in the list.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSources {
    pub keyword: Vec<MatchedQuestion>,
    pub channels: Vec<(EvidenceSource, Vec<CtxList>)>,
}

impl EvidenceSources {
    pub fn question_count(&self) -> usize {
        self.channels
            .iter()
            .map(|(_, lists)| lists.len())
            .chain(std::iter::once(self.keyword_span()))
            .max()
            .unwrap_or(0)
    }

    fn is_keyword_indexed(&self) -> bool {
        self.keyword
            .iter()
            .any(|matched| matched.question_index.is_some())
    }

    fn keyword_span(&self) -> usize {
        if self.is_keyword_indexed() {
            self.keyword
                .iter()
                .filter_map(|matched| matched.question_index)
                .map(|index| index + 1)
                .max()
                .unwrap_or(0)
        } else {
            self.keyword.len()
        }
    }

    /// Keyword entry of the question at `index`.
    ///
    /// Once any entry is indexed, entries without an index are ignored.
    pub fn keyword_for(&self, index: usize) -> Option<&MatchedQuestion> {
        if self.is_keyword_indexed() {
            self.keyword
                .iter()
                .find(|matched| matched.question_index == Some(index))
        } else {
            self.keyword.get(index)
        }
    }
}

/// A `(document, text)` pair merged across channels.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceUnit {
    pub text: String,
    pub sources: BTreeSet<EvidenceSource>,
    pub similarity_score: Option<f64>,
}

impl EvidenceUnit {
    fn absorb(&mut self, source: EvidenceSource, similarity: Option<f64>) {
        self.sources.insert(source);
        // Several scored channels can report the same text; keep the best similarity.
        self.similarity_score = match (self.similarity_score, similarity) {
            (Some(current), Some(incoming)) => Some(current.max(incoming)),
            (current, incoming) => current.or(incoming),
        };
    }
}

/// An evidence unit frozen together with its composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvidence {
    pub document_id: String,
    pub text: String,
    pub sources: Vec<EvidenceSource>,
    pub similarity_score: Option<f64>,
    pub score: f64,
    pub total_blocks_in_document: usize,
}

impl From<ScoredEvidence> for ScoredText {
    fn from(evidence: ScoredEvidence) -> Self {
        Self {
            text: evidence.text,
            sources: evidence.sources,
            score: evidence.score,
        }
    }
}

#[derive(Debug, Default)]
struct DocumentBuilder {
    document_id: String,
    units: Vec<EvidenceUnit>,
    by_text: HashMap<String, usize>,
}

impl DocumentBuilder {
    fn add(&mut self, text: &str, source: EvidenceSource, similarity: Option<f64>) {
        let idx = match self.by_text.get(text) {
            Some(idx) => *idx,
            None => {
                self.units.push(EvidenceUnit {
                    text: text.to_string(),
                    sources: BTreeSet::new(),
                    similarity_score: None,
                });
                let idx = self.units.len() - 1;
                self.by_text.insert(text.to_string(), idx);
                idx
            }
        };
        if let Some(unit) = self.units.get_mut(idx) {
            unit.absorb(source, similarity);
        }
    }

    fn finish(self, weights: &ScoreWeights) -> Vec<ScoredEvidence> {
        let total_blocks_in_document = self.units.len();
        let document_id = self.document_id;
        self.units
            .into_iter()
            .map(|unit| ScoredEvidence {
                score: weights.composite(
                    unit.similarity_score,
                    unit.sources.len(),
                    total_blocks_in_document,
                ),
                document_id: document_id.clone(),
                text: unit.text,
                sources: unit.sources.into_iter().collect(),
                similarity_score: unit.similarity_score,
                total_blocks_in_document,
            })
            .collect()
    }
}

/// Accumulates one question's evidence as Document -> text -> unit.
///
/// Documents and their texts keep first-appearance order.
#[derive(Debug, Default)]
pub struct QuestionEvidenceBuilder {
    documents: Vec<DocumentBuilder>,
    by_document: HashMap<String, usize>,
}

impl QuestionEvidenceBuilder {
    pub fn add(
        &mut self,
        document_id: &str,
        text: &str,
        source: EvidenceSource,
        similarity: Option<f64>,
    ) {
        let idx = match self.by_document.get(document_id) {
            Some(idx) => *idx,
            None => {
                self.documents.push(DocumentBuilder {
                    document_id: document_id.to_string(),
                    ..DocumentBuilder::default()
                });
                let idx = self.documents.len() - 1;
                self.by_document.insert(document_id.to_string(), idx);
                idx
            }
        };
        if let Some(document) = self.documents.get_mut(idx) {
            document.add(text, source, similarity);
        }
    }

    pub fn add_keyword_matches(&mut self, matched: &MatchedQuestion) {
        for record in &matched.matched_texts {
            self.add(&record.pid, &record.text, EvidenceSource::KeywordMatch, None);
        }
    }

    pub fn add_ctxs(&mut self, source: EvidenceSource, list: &CtxList) {
        let similarity = |score: f64| source.is_scored().then_some(score);
        for ctx in &list.ctxs {
            self.add(&ctx.pid, &ctx.text, source, similarity(ctx.score));
        }
    }

    pub fn finish(self, weights: &ScoreWeights) -> Vec<ScoredEvidence> {
        self.documents
            .into_iter()
            .flat_map(|document| document.finish(weights))
            .collect()
    }
}

/// Groups scored evidence back into per-document entries, keeping order.
pub fn group_by_document(evidence: Vec<ScoredEvidence>) -> QuestionEvidence {
    let mut documents: QuestionEvidence = Vec::new();
    let mut by_document: HashMap<String, usize> = HashMap::new();

    for unit in evidence {
        let idx = match by_document.get(&unit.document_id) {
            Some(idx) => *idx,
            None => {
                documents.push(DocumentEvidence {
                    document_id: unit.document_id.clone(),
                    texts: Vec::new(),
                });
                let idx = documents.len() - 1;
                by_document.insert(unit.document_id.clone(), idx);
                idx
            }
        };
        if let Some(document) = documents.get_mut(idx) {
            document.texts.push(unit.into());
        }
    }

    documents
}

pub struct EvidenceAggregator {
    weights: ScoreWeights,
}

impl EvidenceAggregator {
    pub fn new(weights: ScoreWeights) -> Result<Self, AppError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Merges and scores the evidence of the question at `index`.
    pub fn aggregate_question(&self, sources: &EvidenceSources, index: usize) -> Vec<ScoredEvidence> {
        let mut builder = QuestionEvidenceBuilder::default();
        if let Some(matched) = sources.keyword_for(index) {
            builder.add_keyword_matches(matched);
        }
        for (source, lists) in &sources.channels {
            if let Some(list) = lists.get(index) {
                builder.add_ctxs(*source, list);
            }
        }
        builder.finish(&self.weights)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn aggregate(&self, sources: &EvidenceSources) -> Vec<QuestionEvidence> {
        let total = sources.question_count();
        let aggregated: Vec<QuestionEvidence> = (0..total)
            .map(|index| {
                let evidence = self.aggregate_question(sources, index);
                debug!(question = index, units = evidence.len(), "aggregated question evidence");
                group_by_document(evidence)
            })
            .collect();

        info!(
            questions = total,
            documents = aggregated.iter().map(Vec::len).sum::<usize>(),
            "evidence aggregation finished"
        );
        aggregated
    }
}
