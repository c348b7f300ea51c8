use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use common::utils::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "fusion-qa",
    about = "Multi-channel evidence fusion and progressive answer selection",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract key terms, synonyms and a virtual answer for every question
    Analyze(AnalyzeArgs),
    /// Scan a corpus for each question's key terms and keep representative blocks
    Match(MatchArgs),
    /// Merge keyword and retrieval channels into scored per-document evidence
    Aggregate(AggregateArgs),
    /// Run the selection funnel over aggregated evidence and synthesize answers
    Generate(GenerateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PoolSettings {
    /// Number of questions processed at once (overrides config)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl PoolSettings {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.max(1);
        }
    }
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// JSON array of `{question, ...}` objects
    #[arg(long)]
    pub questions: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub pool: PoolSettings,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// Output of `analyze`
    #[arg(long)]
    pub analysis: PathBuf,

    /// JSON array of `{content, pid}` corpus blocks
    #[arg(long)]
    pub corpus: PathBuf,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Output of `match`
    #[arg(long)]
    pub keyword: Option<PathBuf>,

    /// Full-text hits retrieved with the question
    #[arg(long)]
    pub text_query: Option<PathBuf>,

    /// Abstract hits retrieved with the question
    #[arg(long)]
    pub abstract_query: Option<PathBuf>,

    /// Full-text hits retrieved with the virtual answer
    #[arg(long)]
    pub text_virtual: Option<PathBuf>,

    /// Abstract hits retrieved with the virtual answer
    #[arg(long)]
    pub abstract_virtual: Option<PathBuf>,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output of `aggregate`
    #[arg(long)]
    pub evidence: PathBuf,

    /// Question texts, matched to the evidence by position
    #[arg(long)]
    pub questions: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub pool: PoolSettings,

    /// Candidates of one question generated and scored at once (overrides config)
    #[arg(long)]
    pub candidate_concurrency: Option<usize>,

    /// Leave the answer empty instead of synthesizing when no block is well supported
    #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
    pub no_synthesize_when_unsupported: bool,
}

impl GenerateArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        self.pool.apply(config);
        if let Some(candidate_concurrency) = self.candidate_concurrency {
            config.candidate_concurrency = candidate_concurrency.max(1);
        }
        if self.no_synthesize_when_unsupported {
            config.synthesize_when_unsupported = false;
        }
    }
}
