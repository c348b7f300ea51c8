use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use answer_pipeline::{
    analyze_questions, FunnelTuning, OpenAiReasoner, PipelineOrchestrator, Reasoner,
    RetryingReasoner, SelectionFunnel,
};
use common::{
    types::{
        AnalyzedQuestion, CorpusBlock, CtxList, EvidenceSource, MatchedQuestion, QuestionEvidence,
        QuestionRecord,
    },
    utils::{
        artifacts::{read_json, write_json},
        config::{get_config, AppConfig},
    },
};
use evidence_pipeline::{
    match_questions, CoverageTuning, EvidenceAggregator, EvidenceSources, ScoreWeights,
};
use tracing::info;

use crate::args::{AggregateArgs, AnalyzeArgs, GenerateArgs, MatchArgs};

fn load_config() -> Result<AppConfig> {
    get_config().context("loading configuration (config file or environment)")
}

fn build_reasoner(config: &AppConfig) -> Arc<dyn Reasoner> {
    let reasoner: Arc<dyn Reasoner> = Arc::new(OpenAiReasoner::from_config(config));
    Arc::new(RetryingReasoner::new(
        reasoner,
        config.reasoner_max_retries,
        config.reasoner_retry_base_ms,
    ))
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    read_json(path).with_context(|| format!("reading {what} from {}", path.display()))
}

fn write_artifact<T: serde::Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    write_json(path, value).with_context(|| format!("writing {what} to {}", path.display()))
}

pub async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = load_config()?;
    args.pool.apply(&mut config);

    let questions: Vec<QuestionRecord> = read_artifact(&args.questions, "questions")?;
    let reasoner = build_reasoner(&config);
    let analyzed = analyze_questions(reasoner.as_ref(), &questions, config.concurrency).await;

    write_artifact(&args.output, &analyzed, "question analyses")?;
    info!(questions = analyzed.len(), output = %args.output.display(), "analysis written");
    Ok(())
}

pub fn match_keywords(args: &MatchArgs) -> Result<()> {
    let questions: Vec<AnalyzedQuestion> = read_artifact(&args.analysis, "question analyses")?;
    let corpus: Vec<CorpusBlock> = read_artifact(&args.corpus, "corpus")?;

    let matched = match_questions(&questions, &corpus, &CoverageTuning::default())
        .context("matching key terms against the corpus")?;

    write_artifact(&args.output, &matched, "matched texts")?;
    info!(
        questions = questions.len(),
        matched = matched.len(),
        output = %args.output.display(),
        "keyword matches written"
    );
    Ok(())
}

fn read_channel(path: Option<&Path>, source: EvidenceSource) -> Result<Vec<CtxList>> {
    match path {
        Some(path) => read_artifact(path, source.label()),
        None => Ok(Vec::new()),
    }
}

pub fn aggregate(args: &AggregateArgs) -> Result<()> {
    let keyword: Vec<MatchedQuestion> = match &args.keyword {
        Some(path) => read_artifact(path, "keyword matches")?,
        None => Vec::new(),
    };

    let channel_paths = [
        (EvidenceSource::TextByQuery, args.text_query.as_deref()),
        (EvidenceSource::AbstractByQuery, args.abstract_query.as_deref()),
        (EvidenceSource::TextByVirtualAnswer, args.text_virtual.as_deref()),
        (EvidenceSource::AbstractByVirtualAnswer, args.abstract_virtual.as_deref()),
    ];
    let mut channels = Vec::with_capacity(channel_paths.len());
    for (source, path) in channel_paths {
        channels.push((source, read_channel(path, source)?));
    }

    let aggregator =
        EvidenceAggregator::new(ScoreWeights::default()).context("validating score weights")?;
    let aggregated = aggregator.aggregate(&EvidenceSources { keyword, channels });

    write_artifact(&args.output, &aggregated, "aggregated evidence")?;
    info!(questions = aggregated.len(), output = %args.output.display(), "aggregated evidence written");
    Ok(())
}

pub async fn generate(args: GenerateArgs) -> Result<()> {
    let mut config = load_config()?;
    args.apply(&mut config);

    let evidence: Vec<QuestionEvidence> = read_artifact(&args.evidence, "aggregated evidence")?;
    let questions: Vec<QuestionRecord> = read_artifact(&args.questions, "questions")?;
    let questions: Vec<String> = questions.into_iter().map(|record| record.question).collect();

    let funnel = SelectionFunnel::new(build_reasoner(&config), FunnelTuning::from_app_config(&config));
    let orchestrator = PipelineOrchestrator::new(Arc::new(funnel), config.concurrency);
    let records = orchestrator.run(&questions, &evidence).await;

    let failed = records.iter().filter(|record| record.is_failed()).count();
    write_artifact(&args.output, &records, "answers")?;
    info!(
        questions = records.len(),
        failed,
        output = %args.output.display(),
        "answers written"
    );
    Ok(())
}
