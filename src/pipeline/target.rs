//! Binary label validation and extraction
//!
//! Both binning and training require a 0/1 label. Anything else is rejected
//! up front so neither stage produces degenerate output from a bad column.

use anyhow::{Context, Result};
use polars::prelude::*;

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Validate that the label column is binary (contains only 0 and 1)
///
/// Handles edge cases from CSV/Parquet conversion:
/// - Empty or all-null columns
/// - Float64 columns with values like 0.0 and 1.0 (with tolerance)
/// - Integer columns with 0 and 1
pub fn validate_binary_target(df: &DataFrame, target: &str) -> Result<()> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if target_col.len() == 0 {
        anyhow::bail!("Target column '{}' is empty", target);
    }

    if target_col.null_count() == target_col.len() {
        anyhow::bail!("Target column '{}' contains only null values", target);
    }

    if !target_col.dtype().is_primitive_numeric() && target_col.dtype() != &DataType::Boolean {
        anyhow::bail!(
            "Target column '{}' must be binary (0/1), found type {}",
            target,
            target_col.dtype()
        );
    }

    // Cast to Float64 first to handle both integer and float types uniformly
    let float_col = target_col.cast(&DataType::Float64)?;
    let unique = float_col.unique()?;

    let unique_values: Vec<f64> = unique.f64()?.into_iter().flatten().collect();

    let valid = unique_values.len() <= 2
        && unique_values
            .iter()
            .all(|&v| v.abs() < TOLERANCE || (v - 1.0).abs() < TOLERANCE);

    if !valid {
        anyhow::bail!(
            "Target column '{}' must be binary (0/1). Found {} unique values: {:?}",
            target,
            unique_values.len(),
            unique_values
        );
    }

    Ok(())
}

/// Validate the label and return it as `Option<i32>` per row.
///
/// Null labels stay `None`; callers exclude those rows.
pub fn binary_target_values(df: &DataFrame, target: &str) -> Result<Vec<Option<i32>>> {
    validate_binary_target(df, target)?;

    let values = df
        .column(target)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.map(|x| if x > 0.5 { 1 } else { 0 }))
        .collect();

    Ok(values)
}

/// Count (events, non_events, nulls) in a label vector
pub fn count_classes(target_values: &[Option<i32>]) -> (usize, usize, usize) {
    let events = target_values.iter().filter(|v| **v == Some(1)).count();
    let non_events = target_values.iter().filter(|v| **v == Some(0)).count();
    let nulls = target_values.iter().filter(|v| v.is_none()).count();
    (events, non_events, nulls)
}
