use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct FunnelTuning {
    /// The gate stops asking once this many candidates passed.
    pub max_answerable: usize,
    /// Top-ranked candidates kept when the gate admits nothing.
    pub fallback_take: usize,
    /// Support scores must be strictly greater than this to survive fusion.
    pub support_threshold: u8,
    pub max_supported: usize,
    /// Candidates whose answer generation and support scoring run at once.
    pub candidate_concurrency: usize,
    pub synthesize_when_unsupported: bool,
    pub gate_errors_as_rejections: bool,
}

impl Default for FunnelTuning {
    fn default() -> Self {
        Self {
            max_answerable: 10,
            fallback_take: 5,
            support_threshold: 50,
            max_supported: 5,
            candidate_concurrency: 1,
            synthesize_when_unsupported: true,
            gate_errors_as_rejections: true,
        }
    }
}

impl FunnelTuning {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            candidate_concurrency: config.candidate_concurrency.max(1),
            synthesize_when_unsupported: config.synthesize_when_unsupported,
            ..Self::default()
        }
    }
}
