//! WoE transformation
//!
//! Maps raw values to the WoE of the bin they fall in. Used row-wise by the
//! scoring path and column-wise to produce the training dataset.

use anyhow::{Context, Result};
use polars::prelude::*;

use super::binning::{lookup_numeric_woe, FeatureType, VariableBinning, OTHER_CATEGORY};
use super::loader::require_columns;
use super::variables::{woe_column, PREDICTORS};
use crate::artifacts::BinDefinitionSet;

/// A raw input value as seen by the transformer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Number(f64),
    Category(&'a str),
    Missing,
}

impl std::fmt::Display for RawValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Category(c) => write!(f, "{}", c),
            RawValue::Missing => write!(f, "null"),
        }
    }
}

impl VariableBinning {
    /// WoE for a raw value, or `None` when no bin matches.
    ///
    /// Numeric values below the first bin's lower edge (or NaN) match
    /// nothing; the last bin is open-ended. Unknown categories fall into
    /// `OTHER` when that group exists. Nulls use the MISSING bin.
    pub fn woe_for(&self, value: RawValue<'_>) -> Option<f64> {
        match (self.feature_type, value) {
            (_, RawValue::Missing) => self.missing_bin.as_ref().map(|m| m.woe),
            (FeatureType::Numeric, RawValue::Number(v)) => {
                if v.is_nan() {
                    None
                } else {
                    lookup_numeric_woe(v, &self.bins)
                }
            }
            (FeatureType::Numeric, RawValue::Category(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|v| self.woe_for(RawValue::Number(v))),
            (FeatureType::Categorical, RawValue::Category(s)) => self.category_woe(s),
            (FeatureType::Categorical, RawValue::Number(v)) => self.category_woe(&v.to_string()),
        }
    }

    fn category_woe(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .or_else(|| self.categories.iter().find(|c| c.category == OTHER_CATEGORY))
            .map(|c| c.woe)
    }
}

/// Replace each predictor by its `_woe` column.
///
/// The output holds the WoE columns in catalogue order followed by the label
/// column. Values with no matching bin are written as 0; the returned list
/// counts those substitutions per variable (only variables with at least one).
pub fn apply_bins(
    df: &DataFrame,
    bins: &BinDefinitionSet,
    label: &str,
) -> Result<(DataFrame, Vec<(String, usize)>)> {
    require_columns(df, &PREDICTORS)?;
    require_columns(df, &[label])?;

    let mut columns: Vec<Column> = Vec::with_capacity(PREDICTORS.len() + 1);
    let mut substitutions = Vec::new();

    for name in PREDICTORS {
        let binning = bins
            .get(name)
            .with_context(|| format!("Bin definitions have no entry for variable '{}'", name))?;

        let (values, undefined) = transform_column(df.column(name)?, binning)
            .with_context(|| format!("Failed to apply bins to '{}'", name))?;

        if undefined > 0 {
            tracing::warn!(variable = name, count = undefined, "values outside all bins set to WoE 0");
            substitutions.push((name.to_string(), undefined));
        }
        columns.push(Column::new(woe_column(name).into(), values));
    }

    columns.push(df.column(label)?.clone());

    let out = DataFrame::new(columns).context("Failed to assemble WoE dataset")?;
    Ok((out, substitutions))
}

fn transform_column(col: &Column, binning: &VariableBinning) -> Result<(Vec<f64>, usize)> {
    let mut undefined = 0usize;
    let mut values = Vec::with_capacity(col.len());

    let mut push = |woe: Option<f64>| match woe {
        Some(w) => values.push(w),
        None => {
            undefined += 1;
            values.push(0.0);
        }
    };

    match binning.feature_type {
        FeatureType::Numeric => {
            let floats = col.cast(&DataType::Float64)?;
            for v in floats.f64()?.iter() {
                let raw = v.map(RawValue::Number).unwrap_or(RawValue::Missing);
                push(binning.woe_for(raw));
            }
        }
        FeatureType::Categorical => {
            let strings = col.cast(&DataType::String)?;
            for v in strings.str()?.iter() {
                let raw = v.map(RawValue::Category).unwrap_or(RawValue::Missing);
                push(binning.woe_for(raw));
            }
        }
    }

    Ok((values, undefined))
}
