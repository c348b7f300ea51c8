#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod analysis;
pub mod orchestrator;
pub mod pipeline;
pub mod reasoner;
pub mod utils;

pub use analysis::analyze_questions;
pub use orchestrator::{run_ordered, PipelineOrchestrator};
pub use pipeline::{FunnelTuning, SelectionFunnel, SelectionState};
pub use reasoner::{OpenAiReasoner, Reasoner, RetryingReasoner};
