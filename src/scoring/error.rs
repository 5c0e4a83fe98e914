use thiserror::Error;

use super::applicant::FieldError;
use crate::artifacts::ArtifactError;

/// A field whose value matched none of the trained bins
#[derive(Debug, Clone, PartialEq)]
pub struct OutOfRangeField {
    pub field: String,
    pub value: f64,
}

#[derive(Debug, Error)]
pub enum ScoringError {
    /// The request body failed field validation.
    #[error("invalid applicant record: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    /// Values outside every bin under the `reject` policy.
    #[error("value(s) outside the trained bin ranges: {}", describe_out_of_range(.0))]
    OutOfRange(Vec<OutOfRangeField>),

    /// Model feature list does not line up with the variable catalogue.
    #[error("model features do not match the variable catalogue: {0}")]
    FeatureMismatch(String),

    /// Model parameters are inconsistent (length mismatch, non-finite values).
    #[error("invalid scorecard model: {0}")]
    InvalidModel(String),

    #[error("bin definitions have no entry for variable '{0}'")]
    MissingBinning(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_out_of_range(fields: &[OutOfRangeField]) -> String {
    fields
        .iter()
        .map(|f| format!("{}={}", f.field, f.value))
        .collect::<Vec<_>>()
        .join(", ")
}
