//! Scorecard Model artifact (`scorecard_model.json`)

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, write_json, ArtifactError, ArtifactMetadata};
use crate::pipeline::logistic::sigmoid;

/// Per-class sample weights applied during fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    /// Weight of label 0 rows
    pub non_event: f64,
    /// Weight of label 1 rows
    pub event: f64,
}

impl ClassWeights {
    /// Balanced weighting: `n / (2 * n_c)` per class
    pub fn balanced(n_events: usize, n_non_events: usize) -> Self {
        let n = (n_events + n_non_events) as f64;
        Self {
            non_event: n / (2.0 * n_non_events as f64),
            event: n / (2.0 * n_events as f64),
        }
    }

    pub fn for_label(&self, label: i32) -> f64 {
        if label == 1 {
            self.event
        } else {
            self.non_event
        }
    }
}

/// Solver outcome and training-set diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub iterations: usize,
    pub converged: bool,
    /// Class-weighted mean log loss at the solution
    pub log_loss: f64,
    pub auc: f64,
    pub gini: f64,
    pub n_samples: usize,
    pub n_events: usize,
}

/// Fitted logistic scorecard over WOE features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardModel {
    pub metadata: ArtifactMetadata,
    /// WOE feature names, in the order of `coefficients`
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Inverse L2 penalty strength
    pub regularization_c: f64,
    pub class_weights: ClassWeights,
    pub fit: FitSummary,
}

impl ScorecardModel {
    /// Linear predictor `b0 + sum(w_i * x_i)`
    ///
    /// `features` must follow `feature_names`.
    pub fn decision_function(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| acc + w * x)
    }

    /// Probability of the event (label 1)
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision_function(features))
    }

    /// Structural checks: at least one feature, one coefficient per
    /// feature, and finite parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_names.is_empty() {
            return Err("model has no features".to_string());
        }
        if self.feature_names.len() != self.coefficients.len() {
            return Err(format!(
                "{} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err("non-finite model parameter".to_string());
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        write_json(self, path)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let model: ScorecardModel = read_json(path)?;

        model.validate().map_err(|reason| ArtifactError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;

        tracing::info!(
            path = %path.display(),
            features = model.feature_names.len(),
            created_at = %model.metadata.created_at,
            "scorecard model loaded"
        );
        Ok(model)
    }
}
