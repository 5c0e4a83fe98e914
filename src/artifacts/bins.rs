//! Bin Definition Set artifact (`woe_bins.json`)

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, write_json, ArtifactError, ArtifactMetadata};
use crate::pipeline::binning::{BinningConfig, FeatureType, VariableBinning};

/// Per-variable bins plus the settings they were computed with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinDefinitionSet {
    pub metadata: ArtifactMetadata,
    pub config: BinningConfig,
    /// One entry per binned variable, in catalogue order
    pub variables: Vec<VariableBinning>,
}

impl BinDefinitionSet {
    pub fn new(
        metadata: ArtifactMetadata,
        config: BinningConfig,
        variables: Vec<VariableBinning>,
    ) -> Self {
        Self {
            metadata,
            config,
            variables,
        }
    }

    /// Binning for a raw variable name
    pub fn get(&self, variable: &str) -> Option<&VariableBinning> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    /// Names of every binned variable, in stored order
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.variable.as_str()).collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        write_json(self, path)
    }

    /// Load and sanity-check a Bin Definition Set.
    ///
    /// Every variable must have at least one usable bin, numeric bins must be
    /// ordered and contiguous, and no WoE may be non-finite.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let set: BinDefinitionSet = read_json(path)?;

        if let Err(reason) = set.check() {
            return Err(ArtifactError::Invalid {
                path: path.to_path_buf(),
                reason,
            });
        }

        tracing::info!(
            path = %path.display(),
            variables = set.variables.len(),
            created_at = %set.metadata.created_at,
            "bin definitions loaded"
        );
        Ok(set)
    }

    fn check(&self) -> Result<(), String> {
        if self.variables.is_empty() {
            return Err("no variables".to_string());
        }

        for var in &self.variables {
            let has_bins = match var.feature_type {
                FeatureType::Numeric => !var.bins.is_empty(),
                FeatureType::Categorical => !var.categories.is_empty(),
            };
            if !has_bins && var.missing_bin.is_none() {
                return Err(format!("variable '{}' has no bins", var.variable));
            }

            for pair in var.bins.windows(2) {
                if pair[0].upper_bound != pair[1].lower_bound {
                    return Err(format!(
                        "variable '{}' has non-contiguous bins at {}",
                        var.variable, pair[0].upper_bound
                    ));
                }
            }
            if var.bins.iter().any(|b| b.lower_bound >= b.upper_bound) {
                return Err(format!("variable '{}' has an empty bin range", var.variable));
            }

            let mut woes = var
                .bins
                .iter()
                .map(|b| b.woe)
                .chain(var.categories.iter().map(|c| c.woe))
                .chain(var.missing_bin.iter().map(|m| m.woe));
            if woes.any(|w| !w.is_finite()) {
                return Err(format!("variable '{}' has a non-finite WoE", var.variable));
            }
        }

        Ok(())
    }
}
