use common::error::AppError;
use serde::{Deserialize, Serialize};

/// Weights and normalizers of the composite evidence score.
///
/// `score = similarity * (sim / similarity_max)
///        + multi_source * (source_count / source_max)
///        + density * (blocks_in_document / density_max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub similarity: f64,
    pub multi_source: f64,
    pub density: f64,
    pub similarity_max: f64,
    pub source_max: f64,
    pub density_max: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            similarity: 5.0,
            multi_source: 3.0,
            density: 1.0,
            similarity_max: 1.0,
            source_max: 5.0,
            density_max: 10.0,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), AppError> {
        let normalizers = [
            ("similarity_max", self.similarity_max),
            ("source_max", self.source_max),
            ("density_max", self.density_max),
        ];
        for (name, value) in normalizers {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::Validation(format!(
                    "{name} must be a positive, finite number (got {value})"
                )));
            }
        }

        let weights = [
            ("similarity", self.similarity),
            ("multi_source", self.multi_source),
            ("density", self.density),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Validation(format!(
                    "{name} weight must be a non-negative, finite number (got {value})"
                )));
            }
        }

        Ok(())
    }

    /// Composite score of one evidence unit. A unit without similarity counts as `0.0`.
    ///
    /// The density term is not clamped: documents with more merged blocks than
    /// `density_max` keep gaining score.
    #[allow(clippy::cast_precision_loss)]
    pub fn composite(
        &self,
        similarity: Option<f64>,
        source_count: usize,
        blocks_in_document: usize,
    ) -> f64 {
        let similarity_term = similarity.unwrap_or(0.0) / self.similarity_max;
        let source_term = source_count as f64 / self.source_max;
        let density_term = blocks_in_document as f64 / self.density_max;

        self.similarity.mul_add(
            similarity_term,
            self.multi_source
                .mul_add(source_term, self.density * density_term),
        )
    }
}

/// Stable descending sort; ties keep their input order and NaN scores sink to the end.
pub fn sort_by_score_desc<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> f64,
{
    let key = |item: &T| {
        let value = score(item);
        if value.is_nan() {
            f64::NEG_INFINITY
        } else {
            value
        }
    };
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
}
