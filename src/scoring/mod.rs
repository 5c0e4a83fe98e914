//! Single-applicant scoring
//!
//! Shared by the HTTP service and the offline `score` command.

pub mod applicant;
pub mod context;
pub mod error;

pub use applicant::{ApplicantRecord, FieldError, FieldKind, FIELD_KINDS};
pub use context::{ScoreOutcome, ScoringContext};
pub use error::{OutOfRangeField, ScoringError};

use serde::{Deserialize, Serialize};

/// What to do when a value matches none of the trained bins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    /// Use WoE 0 and log a warning
    #[default]
    Neutral,
    /// Fail the request
    Reject,
}

impl std::fmt::Display for OutOfRangePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutOfRangePolicy::Neutral => write!(f, "neutral"),
            OutOfRangePolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for OutOfRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neutral" => Ok(OutOfRangePolicy::Neutral),
            "reject" => Ok(OutOfRangePolicy::Reject),
            _ => Err(format!(
                "Unknown out-of-range policy: '{}'. Use 'neutral' or 'reject'.",
                s
            )),
        }
    }
}

/// Coarse risk label for a default probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskBand {
    pub fn from_probability(p: f64) -> Self {
        if p < 0.2 {
            RiskBand::Low
        } else if p < 0.5 {
            RiskBand::Moderate
        } else if p < 0.7 {
            RiskBand::High
        } else {
            RiskBand::VeryHigh
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
            RiskBand::VeryHigh => "very_high",
        };
        write!(f, "{}", label)
    }
}
