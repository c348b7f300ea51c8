use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    /// Model used for answerability, per-block answers, support scoring and question analysis.
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,
    /// Model used to integrate the supported answers into the final one.
    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: String,
    /// Worker pool size; one question is one unit of work.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_candidate_concurrency")]
    pub candidate_concurrency: usize,
    /// Retries after the first attempt of a Reasoner call.
    #[serde(default = "default_reasoner_max_retries")]
    pub reasoner_max_retries: usize,
    #[serde(default = "default_reasoner_retry_base_ms")]
    pub reasoner_retry_base_ms: u64,
    #[serde(default = "default_true")]
    pub synthesize_when_unsupported: bool,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_reasoning_model() -> String {
    "deepseek-chat".to_string()
}

fn default_synthesis_model() -> String {
    "deepseek-reasoner".to_string()
}

const fn default_concurrency() -> usize {
    32
}

const fn default_candidate_concurrency() -> usize {
    1
}

const fn default_reasoner_max_retries() -> usize {
    3
}

const fn default_reasoner_retry_base_ms() -> u64 {
    200
}

const fn default_true() -> bool {
    true
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default().try_parsing(true));

    build_config(builder)
}

pub fn build_config(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;

    if app_config.concurrency == 0 {
        return Err(ConfigError::Message(
            "concurrency must be greater than zero".into(),
        ));
    }

    Ok(app_config)
}
