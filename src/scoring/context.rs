//! Loaded-once scoring state
//!
//! A [`ScoringContext`] owns the bins and model, already checked against the
//! variable catalogue. It is immutable after construction and cheap to share
//! behind an `Arc`.

use std::path::Path;

use serde_json::Value;

use super::applicant::ApplicantRecord;
use super::error::{OutOfRangeField, ScoringError};
use super::{OutOfRangePolicy, RiskBand};
use crate::artifacts::{BinDefinitionSet, ScorecardModel};
use crate::pipeline::binning::VariableBinning;
use crate::pipeline::variables::{woe_columns, PREDICTORS};
use crate::pipeline::woe::RawValue;

/// Result of scoring one applicant
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub probability: f64,
    pub risk_band: RiskBand,
    /// Fields scored with a neutral WoE because no bin matched
    pub substitutions: Vec<OutOfRangeField>,
}

#[derive(Debug, Clone)]
pub struct ScoringContext {
    /// One binning per predictor, in catalogue order
    binnings: Vec<VariableBinning>,
    model: ScorecardModel,
    policy: OutOfRangePolicy,
}

impl ScoringContext {
    /// Assemble a context, failing when the model's features are not exactly
    /// the catalogue's WoE columns or a predictor has no bins.
    pub fn new(
        bins: BinDefinitionSet,
        model: ScorecardModel,
        policy: OutOfRangePolicy,
    ) -> Result<Self, ScoringError> {
        model.validate().map_err(ScoringError::InvalidModel)?;

        let expected = woe_columns();
        if model.feature_names != expected {
            let unexpected: Vec<&str> = model
                .feature_names
                .iter()
                .filter(|f| !expected.contains(f))
                .map(|f| f.as_str())
                .collect();
            let absent: Vec<&str> = expected
                .iter()
                .filter(|f| !model.feature_names.contains(f))
                .map(|f| f.as_str())
                .collect();

            let detail = if unexpected.is_empty() && absent.is_empty() {
                format!("expected order {:?}, got {:?}", expected, model.feature_names)
            } else {
                format!("missing {:?}, unexpected {:?}", absent, unexpected)
            };
            return Err(ScoringError::FeatureMismatch(detail));
        }

        let mut binnings = Vec::with_capacity(PREDICTORS.len());
        for name in PREDICTORS {
            let binning = bins
                .get(name)
                .ok_or_else(|| ScoringError::MissingBinning(name.to_string()))?;
            binnings.push(binning.clone());
        }

        Ok(Self {
            binnings,
            model,
            policy,
        })
    }

    /// Load both artifacts from disk and assemble the context
    pub fn load(
        bins_path: &Path,
        model_path: &Path,
        policy: OutOfRangePolicy,
    ) -> Result<Self, ScoringError> {
        let bins = BinDefinitionSet::load(bins_path)?;
        let model = ScorecardModel::load(model_path)?;
        Self::new(bins, model, policy)
    }

    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }

    pub fn feature_count(&self) -> usize {
        self.model.feature_names.len()
    }

    /// WoE vector for an applicant in model order, plus the fields that
    /// matched no bin (scored as 0)
    pub fn woe_vector(&self, applicant: &ApplicantRecord) -> (Vec<f64>, Vec<OutOfRangeField>) {
        let mut woes = Vec::with_capacity(self.binnings.len());
        let mut undefined = Vec::new();

        for (binning, (field, value)) in self.binnings.iter().zip(applicant.values()) {
            match binning.woe_for(RawValue::Number(value)) {
                Some(woe) => woes.push(woe),
                None => {
                    woes.push(0.0);
                    undefined.push(OutOfRangeField {
                        field: field.to_string(),
                        value,
                    });
                }
            }
        }

        (woes, undefined)
    }

    /// Default probability for one applicant
    pub fn score(&self, applicant: &ApplicantRecord) -> Result<ScoreOutcome, ScoringError> {
        let (woes, undefined) = self.woe_vector(applicant);

        if !undefined.is_empty() {
            match self.policy {
                OutOfRangePolicy::Reject => return Err(ScoringError::OutOfRange(undefined)),
                OutOfRangePolicy::Neutral => {
                    for f in &undefined {
                        tracing::warn!(
                            variable = %f.field,
                            value = f.value,
                            "value outside trained bins, using neutral WoE"
                        );
                    }
                }
            }
        }

        let probability = self.model.predict_proba(&woes);
        Ok(ScoreOutcome {
            probability,
            risk_band: RiskBand::from_probability(probability),
            substitutions: undefined,
        })
    }

    /// Validate a raw JSON body and score it
    pub fn score_json(&self, body: &Value) -> Result<ScoreOutcome, ScoringError> {
        let applicant = ApplicantRecord::from_json_value(body).map_err(ScoringError::Validation)?;
        self.score(&applicant)
    }
}
