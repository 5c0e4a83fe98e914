//! Weight of Evidence (WoE) binning
//!
//! Supervised discretization of each predictor against the binary default
//! label. Numeric variables are pre-binned either with CART-style impurity
//! splits or equal-frequency quantiles (followed by greedy IV-preserving
//! merging); categorical variables are grouped by value with rare
//! categories folded into `OTHER`. Null values get a dedicated MISSING bin.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::metrics::gini;
use super::target::{binary_target_values, count_classes};

/// Number of initial quantile pre-bins before merging
const PRE_BIN_COUNT: usize = 50;

/// Minimum samples per bin to avoid unstable WoE estimates
const MIN_BIN_SAMPLES: usize = 5;

/// Smoothing constant to avoid log(0) in WoE calculation (Laplace smoothing)
const SMOOTHING: f64 = 0.5;

/// Group that collects categories rarer than `min_category_samples`
pub const OTHER_CATEGORY: &str = "OTHER";

/// Binning strategy for pre-bin creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinningStrategy {
    /// Equal-frequency pre-bins merged greedily down to the bin limit
    Quantile,
    /// CART-style decision tree binning - splits maximize impurity reduction
    #[default]
    Cart,
}

impl std::fmt::Display for BinningStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinningStrategy::Quantile => write!(f, "quantile"),
            BinningStrategy::Cart => write!(f, "cart"),
        }
    }
}

impl std::str::FromStr for BinningStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quantile" => Ok(BinningStrategy::Quantile),
            "cart" => Ok(BinningStrategy::Cart),
            _ => Err(format!("Unknown binning strategy: '{}'. Use 'quantile' or 'cart'.", s)),
        }
    }
}

/// Feature type of a binned variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Numeric,
    Categorical,
}

/// Knobs for the binning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningConfig {
    pub strategy: BinningStrategy,
    /// Upper limit on bins per numeric variable (excluding MISSING)
    pub max_bins: usize,
    /// Minimum bin size as a percentage of the variable's non-null rows (CART only)
    pub min_bin_pct: f64,
    /// Categories with fewer rows are merged into `OTHER`
    pub min_category_samples: usize,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            strategy: BinningStrategy::Cart,
            max_bins: 8,
            min_bin_pct: 5.0,
            min_category_samples: 5,
        }
    }
}

/// Bin edges are `null` in JSON when unbounded
mod edge {
    pub mod lower {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
            if value.is_finite() {
                s.serialize_some(value)
            } else {
                s.serialize_none()
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NEG_INFINITY))
        }
    }

    pub mod upper {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
            if value.is_finite() {
                s.serialize_some(value)
            } else {
                s.serialize_none()
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
        }
    }
}

/// A single numeric bin with WoE statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoeBin {
    /// Lower bound (inclusive)
    #[serde(with = "edge::lower")]
    pub lower_bound: f64,
    /// Upper bound (exclusive)
    #[serde(with = "edge::upper")]
    pub upper_bound: f64,
    /// Count of events (default = 1) in this bin
    pub events: f64,
    /// Count of non-events (default = 0) in this bin
    pub non_events: f64,
    /// Weight of Evidence for this bin
    pub woe: f64,
    /// Contribution to total IV from this bin
    pub iv_contribution: f64,
    /// Total samples in this bin
    pub count: f64,
    /// Percentage of total population in this bin
    pub population_pct: f64,
    /// Event rate (events / count)
    pub event_rate: f64,
}

impl WoeBin {
    /// Whether `value` falls in `[lower_bound, upper_bound)`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value < self.upper_bound
    }
}

/// A single category group with WoE statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalWoeBin {
    pub category: String,
    pub events: f64,
    pub non_events: f64,
    pub woe: f64,
    pub iv_contribution: f64,
    pub count: f64,
    pub population_pct: f64,
    pub event_rate: f64,
}

/// A bin for missing/null values with WoE statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingBin {
    pub events: f64,
    pub non_events: f64,
    pub woe: f64,
    pub iv_contribution: f64,
    pub count: f64,
    pub population_pct: f64,
    pub event_rate: f64,
}

/// Complete binning of a single variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBinning {
    /// Raw variable name
    pub variable: String,
    pub feature_type: FeatureType,
    /// Ordered numeric bins (numeric variables)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bins: Vec<WoeBin>,
    /// Category groups sorted by WoE (categorical variables)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoricalWoeBin>,
    /// MISSING bin, present when the training data had nulls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_bin: Option<MissingBin>,
    /// Total Information Value
    pub iv: f64,
    /// Gini coefficient of the WoE encoding
    pub gini: f64,
}

/// Class totals every bin's WoE is computed against
#[derive(Debug, Clone, Copy)]
struct Totals {
    events: f64,
    non_events: f64,
    samples: f64,
}

// ============================================================================
// CART Binning Helper Functions
// ============================================================================

/// Gini impurity for a binary node: 2 * p * (1 - p)
fn gini_impurity(events: f64, non_events: f64) -> f64 {
    let total = events + non_events;
    if total == 0.0 {
        return 0.0;
    }
    let p = events / total;
    2.0 * p * (1.0 - p)
}

/// Find the split index that maximizes impurity reduction
///
/// `sorted_pairs` is `(value, target)` sorted by value. Both sides of the
/// split must hold at least `min_samples` rows and the split never falls
/// between two equal values.
///
/// Returns `(split_index, gain)` where `split_index` is the first row of the
/// right-hand side.
fn find_best_split(sorted_pairs: &[(f64, i32)], min_samples: usize) -> Option<(usize, f64)> {
    let n = sorted_pairs.len();
    if n < 2 * min_samples {
        return None;
    }

    let total_events = sorted_pairs.iter().filter(|(_, t)| *t == 1).count() as f64;
    let total_non_events = n as f64 - total_events;
    let parent_gini = gini_impurity(total_events, total_non_events);

    let mut best_gain = 0.0;
    let mut best_split_idx = None;

    let mut left_events = 0.0f64;
    let mut left_non_events = 0.0f64;

    for i in 0..n - 1 {
        if sorted_pairs[i].1 == 1 {
            left_events += 1.0;
        } else {
            left_non_events += 1.0;
        }

        let left_count = i + 1;
        let right_count = n - left_count;

        if left_count < min_samples || right_count < min_samples {
            continue;
        }

        if (sorted_pairs[i].0 - sorted_pairs[i + 1].0).abs() < 1e-10 {
            continue;
        }

        let right_events = total_events - left_events;
        let right_non_events = total_non_events - left_non_events;

        let left_prop = left_count as f64 / n as f64;
        let right_prop = right_count as f64 / n as f64;

        let weighted_child_gini = left_prop * gini_impurity(left_events, left_non_events)
            + right_prop * gini_impurity(right_events, right_non_events);

        let gain = parent_gini - weighted_child_gini;

        if gain > best_gain {
            best_gain = gain;
            best_split_idx = Some(i + 1);
        }
    }

    best_split_idx.map(|idx| (idx, best_gain))
}

/// Recursively collect CART split indices (global offsets into the full slice)
fn find_cart_splits_recursive(
    sorted_pairs: &[(f64, i32)],
    offset: usize,
    max_splits: usize,
    min_samples: usize,
    split_indices: &mut Vec<usize>,
) {
    if max_splits == 0 || sorted_pairs.len() < 2 * min_samples {
        return;
    }

    if let Some((local_split_idx, _gain)) = find_best_split(sorted_pairs, min_samples) {
        let global_split_idx = offset + local_split_idx;
        split_indices.push(global_split_idx);

        let (left, right) = sorted_pairs.split_at(local_split_idx);

        let remaining_splits = max_splits - 1;
        let left_splits = remaining_splits / 2;
        let right_splits = remaining_splits - left_splits;

        find_cart_splits_recursive(left, offset, left_splits, min_samples, split_indices);
        find_cart_splits_recursive(right, global_split_idx, right_splits, min_samples, split_indices);
    }
}

/// Create bins from CART split points
fn create_cart_bins(
    sorted_pairs: &[(f64, i32)],
    max_bins: usize,
    min_bin_samples: usize,
    totals: Totals,
) -> Vec<WoeBin> {
    let mut split_indices = Vec::new();
    find_cart_splits_recursive(
        sorted_pairs,
        0,
        max_bins.saturating_sub(1),
        min_bin_samples,
        &mut split_indices,
    );
    split_indices.sort_unstable();

    bins_from_split_indices(sorted_pairs, &split_indices, totals)
}

/// Cut `sorted_pairs` at the given indices; each bin's upper edge is the
/// first value of the next bin and the last bin is open-ended.
fn bins_from_split_indices(
    sorted_pairs: &[(f64, i32)],
    split_indices: &[usize],
    totals: Totals,
) -> Vec<WoeBin> {
    let n = sorted_pairs.len();
    let mut bins = Vec::with_capacity(split_indices.len() + 1);
    let mut start_idx = 0;

    for &split_idx in split_indices.iter().chain(std::iter::once(&n)) {
        if split_idx <= start_idx || split_idx > n {
            continue;
        }
        let upper = if split_idx < n {
            sorted_pairs[split_idx].0
        } else {
            f64::INFINITY
        };
        bins.push(bin_from_pairs(&sorted_pairs[start_idx..split_idx], upper, totals));
        start_idx = split_idx;
    }

    bins
}

/// Create a WoeBin from a non-empty slice of sorted pairs
fn bin_from_pairs(bin_pairs: &[(f64, i32)], upper: f64, totals: Totals) -> WoeBin {
    let lower = bin_pairs
        .first()
        .map(|(v, _)| *v)
        .unwrap_or(f64::NEG_INFINITY);

    let events = bin_pairs.iter().filter(|(_, t)| *t == 1).count() as f64;
    let non_events = bin_pairs.len() as f64 - events;
    let count = events + non_events;

    let (woe, iv_contribution) = calculate_woe_iv(events, non_events, totals.events, totals.non_events);

    WoeBin {
        lower_bound: lower,
        upper_bound: upper,
        events,
        non_events,
        woe,
        iv_contribution,
        count,
        population_pct: count / totals.samples * 100.0,
        event_rate: if count > 0.0 { events / count } else { 0.0 },
    }
}

// ============================================================================
// Main Binning Functions
// ============================================================================

/// Bin the given variables against the binary label.
///
/// Numeric columns get numeric bins, string/categorical columns get category
/// groups. Variables are analyzed in parallel; results come back in the
/// order of `variables`. Any variable that cannot be binned fails the whole
/// call, since the scorecard needs every one of them.
pub fn bin_variables(
    df: &DataFrame,
    target: &str,
    variables: &[&str],
    config: &BinningConfig,
) -> Result<Vec<VariableBinning>> {
    let target_values = binary_target_values(df, target)?;

    let (events, non_events, nulls) = count_classes(&target_values);
    if events == 0 || non_events == 0 {
        anyhow::bail!(
            "Target column '{}' must contain both classes (found {} events, {} non-events)",
            target,
            events,
            non_events
        );
    }
    if nulls > 0 {
        tracing::warn!(target, nulls, "rows with a null label are excluded from binning");
    }

    let pb = ProgressBar::new(variables.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "   Binning variables [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    let progress_counter = AtomicU64::new(0);

    let results: Result<Vec<VariableBinning>> = variables
        .par_iter()
        .map(|name| {
            let col = df
                .column(name)
                .with_context(|| format!("Variable '{}' not found in dataset", name))?;

            let result = if col.dtype().is_primitive_numeric() {
                bin_numeric_variable(df, name, &target_values, config)
            } else if matches!(col.dtype(), DataType::String | DataType::Categorical(_, _)) {
                bin_categorical_variable(df, name, &target_values, config.min_category_samples)
            } else {
                Err(anyhow::anyhow!(
                    "Variable '{}' has unsupported type {} for binning",
                    name,
                    col.dtype()
                ))
            };

            let count = progress_counter.fetch_add(1, Ordering::Relaxed);
            pb.set_position(count + 1);

            result
        })
        .collect();

    let analyses = results?;
    pb.finish_with_message(format!("   [OK] Binned {} variables", analyses.len()));

    Ok(analyses)
}

/// Non-null values of a predictor must be seen with both label classes.
///
/// An all-null predictor passes and is binned as MISSING only.
fn ensure_present_variation(col_name: &str, events: f64, non_events: f64) -> Result<()> {
    if events + non_events > 0.0 && (events <= 0.0 || non_events <= 0.0) {
        anyhow::bail!(
            "Variable '{}' has no variation in target among non-missing values (all 0s or all 1s)",
            col_name
        );
    }
    Ok(())
}

/// Bin a single numeric variable
///
/// Missing values (null or NaN) are placed in a dedicated MISSING bin.
/// Only records with a null label are excluded.
fn bin_numeric_variable(
    df: &DataFrame,
    col_name: &str,
    target_values: &[Option<i32>],
    config: &BinningConfig,
) -> Result<VariableBinning> {
    let float_col = df.column(col_name)?.cast(&DataType::Float64)?;
    let values = float_col.f64()?;

    let mut pairs: Vec<(f64, i32)> = Vec::new();
    let mut missing_events = 0.0f64;
    let mut missing_non_events = 0.0f64;

    for (v, t) in values.iter().zip(target_values.iter()) {
        match (v, t) {
            (Some(val), Some(target)) if !val.is_nan() => pairs.push((val, *target)),
            (_, Some(target)) => {
                if *target == 1 {
                    missing_events += 1.0;
                } else {
                    missing_non_events += 1.0;
                }
            }
            (_, None) => {}
        }
    }

    let missing_count = missing_events + missing_non_events;
    let present_events = pairs.iter().filter(|(_, t)| *t == 1).count() as f64;
    let present_non_events = pairs.len() as f64 - present_events;
    ensure_present_variation(col_name, present_events, present_non_events)?;

    let total_events = present_events + missing_events;
    let total_non_events = present_non_events + missing_non_events;

    let totals = Totals {
        events: total_events,
        non_events: total_non_events,
        samples: total_events + total_non_events,
    };

    let missing_bin = build_missing_bin(missing_events, missing_non_events, missing_count, totals);

    let bins = if pairs.is_empty() {
        Vec::new()
    } else {
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        numeric_bins(&pairs, config, totals)
    };

    let bins_iv: f64 = bins.iter().map(|b| b.iv_contribution).sum();
    let missing_iv = missing_bin.as_ref().map(|b| b.iv_contribution).unwrap_or(0.0);

    let mut scored: Vec<(f64, i32, f64)> = pairs
        .iter()
        .map(|(val, target)| (lookup_numeric_woe(*val, &bins).unwrap_or(0.0), *target, 1.0))
        .collect();
    push_missing_scores(&mut scored, missing_bin.as_ref());

    Ok(VariableBinning {
        variable: col_name.to_string(),
        feature_type: FeatureType::Numeric,
        bins,
        categories: Vec::new(),
        missing_bin,
        iv: bins_iv + missing_iv,
        gini: gini(scored),
    })
}

/// Choose bins for sorted non-missing pairs according to the strategy.
///
/// Too few rows to split yields a single catch-all bin.
fn numeric_bins(sorted_pairs: &[(f64, i32)], config: &BinningConfig, totals: Totals) -> Vec<WoeBin> {
    let n = sorted_pairs.len();
    let pct_samples = (config.min_bin_pct / 100.0 * n as f64).ceil() as usize;
    let min_samples = pct_samples.max(MIN_BIN_SAMPLES);
    let max_bins = config.max_bins.max(1);

    if n < 2 * min_samples || max_bins == 1 {
        return vec![bin_from_pairs(sorted_pairs, f64::INFINITY, totals)];
    }

    match config.strategy {
        BinningStrategy::Cart => create_cart_bins(sorted_pairs, max_bins, min_samples, totals),
        BinningStrategy::Quantile => {
            let pre_bins = create_quantile_prebins(sorted_pairs, PRE_BIN_COUNT, totals);
            greedy_merge_bins(pre_bins, max_bins, totals)
        }
    }
}

fn build_missing_bin(
    missing_events: f64,
    missing_non_events: f64,
    missing_count: f64,
    totals: Totals,
) -> Option<MissingBin> {
    if missing_count <= 0.0 {
        return None;
    }
    let (woe, iv_contribution) =
        calculate_woe_iv(missing_events, missing_non_events, totals.events, totals.non_events);
    Some(MissingBin {
        events: missing_events,
        non_events: missing_non_events,
        woe,
        iv_contribution,
        count: missing_count,
        population_pct: missing_count / totals.samples * 100.0,
        event_rate: missing_events / missing_count,
    })
}

fn push_missing_scores(scored: &mut Vec<(f64, i32, f64)>, missing_bin: Option<&MissingBin>) {
    if let Some(mb) = missing_bin {
        if mb.events > 0.0 {
            scored.push((mb.woe, 1, mb.events));
        }
        if mb.non_events > 0.0 {
            scored.push((mb.woe, 0, mb.non_events));
        }
    }
}

/// Bin a categorical variable
///
/// Missing values go to the MISSING bin; categories with fewer than
/// `min_category_samples` rows are merged into `OTHER`.
fn bin_categorical_variable(
    df: &DataFrame,
    col_name: &str,
    target_values: &[Option<i32>],
    min_category_samples: usize,
) -> Result<VariableBinning> {
    let string_col = df.column(col_name)?.cast(&DataType::String)?;
    let values = string_col.str()?;

    // category -> (events, non_events, raw_count)
    let mut category_stats: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    let mut missing_events = 0.0f64;
    let mut missing_non_events = 0.0f64;

    for (val, target) in values.iter().zip(target_values.iter()) {
        match (val, target) {
            (Some(cat), Some(t)) => {
                let entry = category_stats.entry(cat.to_string()).or_insert((0.0, 0.0, 0));
                if *t == 1 {
                    entry.0 += 1.0;
                } else {
                    entry.1 += 1.0;
                }
                entry.2 += 1;
            }
            (None, Some(t)) => {
                if *t == 1 {
                    missing_events += 1.0;
                } else {
                    missing_non_events += 1.0;
                }
            }
            (_, None) => {}
        }
    }

    let present_events: f64 = category_stats.values().map(|(e, _, _)| *e).sum();
    let present_non_events: f64 = category_stats.values().map(|(_, ne, _)| *ne).sum();
    ensure_present_variation(col_name, present_events, present_non_events)?;

    let total_events = present_events + missing_events;
    let total_non_events = present_non_events + missing_non_events;

    let totals = Totals {
        events: total_events,
        non_events: total_non_events,
        samples: total_events + total_non_events,
    };

    let missing_bin = build_missing_bin(
        missing_events,
        missing_non_events,
        missing_events + missing_non_events,
        totals,
    );

    let mut other_events = 0.0f64;
    let mut other_non_events = 0.0f64;
    let mut final_categories: Vec<(String, f64, f64)> = Vec::new();

    for (cat, (events, non_events, raw_count)) in category_stats {
        if raw_count < min_category_samples {
            other_events += events;
            other_non_events += non_events;
        } else {
            final_categories.push((cat, events, non_events));
        }
    }

    if other_events + other_non_events > 0.0 {
        final_categories.push((OTHER_CATEGORY.to_string(), other_events, other_non_events));
    }

    let mut categories: Vec<CategoricalWoeBin> = final_categories
        .into_iter()
        .map(|(category, events, non_events)| {
            let count = events + non_events;
            let (woe, iv_contribution) =
                calculate_woe_iv(events, non_events, totals.events, totals.non_events);

            CategoricalWoeBin {
                category,
                events,
                non_events,
                woe,
                iv_contribution,
                count,
                population_pct: count / totals.samples * 100.0,
                event_rate: if count > 0.0 { events / count } else { 0.0 },
            }
        })
        .collect();

    categories.sort_by(|a, b| a.woe.partial_cmp(&b.woe).unwrap_or(std::cmp::Ordering::Equal));

    let categories_iv: f64 = categories.iter().map(|c| c.iv_contribution).sum();
    let missing_iv = missing_bin.as_ref().map(|b| b.iv_contribution).unwrap_or(0.0);

    let mut scored: Vec<(f64, i32, f64)> = Vec::new();
    for cat in &categories {
        if cat.events > 0.0 {
            scored.push((cat.woe, 1, cat.events));
        }
        if cat.non_events > 0.0 {
            scored.push((cat.woe, 0, cat.non_events));
        }
    }
    push_missing_scores(&mut scored, missing_bin.as_ref());

    Ok(VariableBinning {
        variable: col_name.to_string(),
        feature_type: FeatureType::Categorical,
        bins: Vec::new(),
        categories,
        missing_bin,
        iv: categories_iv + missing_iv,
        gini: gini(scored),
    })
}

/// Create equal-frequency pre-bins. Chunk edges are pushed past runs of
/// equal values so a value never straddles two bins.
fn create_quantile_prebins(
    sorted_pairs: &[(f64, i32)],
    num_prebins: usize,
    totals: Totals,
) -> Vec<WoeBin> {
    let n = sorted_pairs.len();
    let bin_size = n.div_ceil(num_prebins.max(1));

    let mut split_indices = Vec::new();
    let mut end_idx = 0;

    while end_idx < n {
        end_idx = (end_idx + bin_size).min(n);
        while end_idx < n && sorted_pairs[end_idx].0 == sorted_pairs[end_idx - 1].0 {
            end_idx += 1;
        }
        if end_idx < n {
            split_indices.push(end_idx);
        }
    }

    bins_from_split_indices(sorted_pairs, &split_indices, totals)
}

/// Calculate WoE and IV contribution for a bin
///
/// Uses the ln(%bad/%good) convention where:
/// - WoE > 0 indicates higher risk (more defaults)
/// - WoE < 0 indicates lower risk (fewer defaults)
pub fn calculate_woe_iv(
    events: f64,
    non_events: f64,
    total_events: f64,
    total_non_events: f64,
) -> (f64, f64) {
    let dist_events = (events + SMOOTHING) / (total_events + SMOOTHING);
    let dist_non_events = (non_events + SMOOTHING) / (total_non_events + SMOOTHING);

    let woe = (dist_events / dist_non_events).ln();
    let iv_contrib = (dist_events - dist_non_events) * woe;

    (woe, iv_contrib)
}

/// Greedy merge bins to minimize IV loss until target bin count is reached
fn greedy_merge_bins(mut bins: Vec<WoeBin>, target_bins: usize, totals: Totals) -> Vec<WoeBin> {
    while bins.len() > target_bins && bins.len() > 1 {
        let mut min_loss = f64::MAX;
        let mut merge_idx = 0;

        for i in 0..bins.len() - 1 {
            let merged = merge_two_bins(&bins[i], &bins[i + 1], totals);
            let loss = bins[i].iv_contribution + bins[i + 1].iv_contribution - merged.iv_contribution;

            if loss < min_loss {
                min_loss = loss;
                merge_idx = i;
            }
        }

        let merged = merge_two_bins(&bins[merge_idx], &bins[merge_idx + 1], totals);
        bins.remove(merge_idx + 1);
        bins[merge_idx] = merged;
    }

    bins
}

/// Merge two adjacent bins into one
fn merge_two_bins(bin1: &WoeBin, bin2: &WoeBin, totals: Totals) -> WoeBin {
    let events = bin1.events + bin2.events;
    let non_events = bin1.non_events + bin2.non_events;
    let count = bin1.count + bin2.count;
    let (woe, iv_contribution) = calculate_woe_iv(events, non_events, totals.events, totals.non_events);

    WoeBin {
        lower_bound: bin1.lower_bound,
        upper_bound: bin2.upper_bound,
        events,
        non_events,
        woe,
        iv_contribution,
        count,
        population_pct: count / totals.samples * 100.0,
        event_rate: if count > 0.0 { events / count } else { 0.0 },
    }
}

/// WoE of the numeric bin containing `value`, if any
pub fn lookup_numeric_woe(value: f64, bins: &[WoeBin]) -> Option<f64> {
    bins.iter().find(|bin| bin.contains(value)).map(|bin| bin.woe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(events: f64, non_events: f64) -> Totals {
        Totals {
            events,
            non_events,
            samples: events + non_events,
        }
    }

    #[test]
    fn test_woe_iv_calculation() {
        let (woe, iv) = calculate_woe_iv(10.0, 90.0, 100.0, 900.0);

        assert!(woe.abs() < 0.1, "WoE should be close to 0 for equal distributions");
        assert!(iv >= 0.0, "IV should be non-negative");
    }

    #[test]
    fn test_woe_sign_follows_default_rate() {
        let (risky, _) = calculate_woe_iv(50.0, 50.0, 100.0, 900.0);
        let (safe, _) = calculate_woe_iv(5.0, 400.0, 100.0, 900.0);
        assert!(risky > 0.0, "Over-represented defaults should give positive WoE");
        assert!(safe < 0.0, "Under-represented defaults should give negative WoE");
    }

    #[test]
    fn test_gini_impurity() {
        assert!((gini_impurity(0.0, 10.0) - 0.0).abs() < 0.01);
        assert!((gini_impurity(10.0, 0.0) - 0.0).abs() < 0.01);
        assert!((gini_impurity(5.0, 5.0) - 0.5).abs() < 0.01);

        let skewed = gini_impurity(9.0, 1.0);
        assert!(skewed < 0.5 && skewed > 0.0);
    }

    #[test]
    fn test_find_best_split() {
        let pairs = vec![(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)];

        let (split_idx, gain) = find_best_split(&pairs, 1).expect("Should find a split");
        assert_eq!(split_idx, 2, "Should split between 2.0 and 3.0");
        assert!(gain > 0.0);
    }

    #[test]
    fn test_find_best_split_no_valid_split() {
        let pairs = vec![(1.0, 0), (2.0, 1)];
        assert!(find_best_split(&pairs, 2).is_none());
    }

    #[test]
    fn test_find_best_split_never_separates_equal_values() {
        // The only impurity-reducing cut would land inside the run of 5.0s
        let pairs = vec![(5.0, 0), (5.0, 0), (5.0, 1), (5.0, 1)];
        assert!(find_best_split(&pairs, 1).is_none());
    }

    #[test]
    fn test_binning_strategy_from_str() {
        assert_eq!("quantile".parse::<BinningStrategy>().unwrap(), BinningStrategy::Quantile);
        assert_eq!("CART".parse::<BinningStrategy>().unwrap(), BinningStrategy::Cart);
        assert!("chimerge".parse::<BinningStrategy>().is_err());
    }

    #[test]
    fn test_binning_strategy_display() {
        assert_eq!(BinningStrategy::Quantile.to_string(), "quantile");
        assert_eq!(BinningStrategy::Cart.to_string(), "cart");
    }

    #[test]
    fn test_cart_bins_cover_all_samples_contiguously() {
        let pairs: Vec<(f64, i32)> = (0..20).map(|i| (i as f64, if i < 10 { 0 } else { 1 })).collect();

        let bins = create_cart_bins(&pairs, 3, 2, totals(10.0, 10.0));

        assert!(!bins.is_empty() && bins.len() <= 3);
        let total_count: f64 = bins.iter().map(|b| b.count).sum();
        assert!((total_count - 20.0).abs() < 0.01, "All samples should be binned");

        for pair in bins.windows(2) {
            assert_eq!(pair[0].upper_bound, pair[1].lower_bound, "Bins must be contiguous");
        }
        assert_eq!(bins[0].lower_bound, 0.0);
        assert!(bins.last().unwrap().upper_bound.is_infinite());
    }

    #[test]
    fn test_quantile_prebins_respect_ties() {
        // 36/60 loan terms: no pre-bin may split a run of equal values
        let mut pairs: Vec<(f64, i32)> = Vec::new();
        for i in 0..30 {
            pairs.push((36.0, if i % 5 == 0 { 1 } else { 0 }));
        }
        for i in 0..20 {
            pairs.push((60.0, if i % 2 == 0 { 1 } else { 0 }));
        }

        let bins = create_quantile_prebins(&pairs, 10, totals(16.0, 34.0));
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 30.0);
        assert_eq!(bins[0].upper_bound, 60.0);
        assert_eq!(bins[1].lower_bound, 60.0);
    }

    #[test]
    fn test_greedy_merge_reaches_target() {
        let pairs: Vec<(f64, i32)> = (0..100).map(|i| (i as f64, if i % 3 == 0 { 1 } else { 0 })).collect();
        let t = totals(34.0, 66.0);

        let prebins = create_quantile_prebins(&pairs, 20, t);
        assert_eq!(prebins.len(), 20);

        let merged = greedy_merge_bins(prebins, 4, t);
        assert_eq!(merged.len(), 4);
        let total_count: f64 = merged.iter().map(|b| b.count).sum();
        assert!((total_count - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_variable_with_missing_values() {
        let df = df! {
            "default" => [0i32, 0, 1, 1, 0, 1, 0, 1, 0, 1],
            "dti" => [Some(1.0f64), Some(2.0), None, Some(4.0), None, Some(6.0), Some(7.0), Some(8.0), Some(9.0), Some(10.0)],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let analysis =
            bin_numeric_variable(&df, "dti", &target_values, &BinningConfig::default()).unwrap();

        let missing_bin = analysis.missing_bin.expect("Should have a MISSING bin");
        assert!((missing_bin.count - 2.0).abs() < 0.01);
        assert!((missing_bin.events - 1.0).abs() < 0.01);
        assert!((missing_bin.non_events - 1.0).abs() < 0.01);
        assert!(analysis.iv >= 0.0);
    }

    #[test]
    fn test_numeric_variable_without_missing_values() {
        let df = df! {
            "default" => [0i32, 0, 1, 1, 0, 1, 0, 1, 0, 1],
            "dti" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let analysis =
            bin_numeric_variable(&df, "dti", &target_values, &BinningConfig::default()).unwrap();
        assert!(analysis.missing_bin.is_none());
    }

    #[test]
    fn test_too_few_rows_yield_single_catch_all_bin() {
        let df = df! {
            "default" => [0i32, 1, 0, 1, 0, 1],
            "mort_acc" => [0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let analysis =
            bin_numeric_variable(&df, "mort_acc", &target_values, &BinningConfig::default()).unwrap();

        assert_eq!(analysis.bins.len(), 1);
        assert_eq!(analysis.bins[0].lower_bound, 0.0);
        assert!(analysis.bins[0].upper_bound.is_infinite());
        assert_eq!(analysis.bins[0].count, 6.0);
    }

    #[test]
    fn test_single_class_present_values_fail() {
        let df = df! {
            "default" => [0i32, 0, 0, 1, 1, 1],
            "dti" => [Some(1.0f64), Some(2.0), Some(3.0), None, None, None],
            "grade" => [Some("A"), Some("B"), Some("A"), None, None, None],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let err = bin_numeric_variable(&df, "dti", &target_values, &BinningConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("'dti'"));

        let err = bin_categorical_variable(&df, "grade", &target_values, 1).unwrap_err();
        assert!(err.to_string().contains("'grade'"));
    }

    #[test]
    fn test_all_missing_values_only_missing_bin() {
        let df = df! {
            "default" => [0i32, 0, 1, 1, 0, 1],
            "dti" => [None::<f64>, None, None, None, None, None],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let analysis =
            bin_numeric_variable(&df, "dti", &target_values, &BinningConfig::default()).unwrap();

        assert!(analysis.bins.is_empty());
        let missing_bin = analysis.missing_bin.unwrap();
        assert!((missing_bin.count - 6.0).abs() < 0.01);
    }

    #[test]
    fn test_null_labels_are_excluded() {
        let df = df! {
            "default" => [Some(0i32), Some(0), Some(1), None, Some(0), Some(1), Some(0), Some(1), None, Some(1), Some(0), Some(1)],
            "dti" => [Some(1.0f64), Some(2.0), None, Some(4.0), None, Some(6.0), Some(7.0), Some(8.0), Some(9.0), Some(10.0), Some(11.0), Some(12.0)],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let analysis =
            bin_numeric_variable(&df, "dti", &target_values, &BinningConfig::default()).unwrap();

        let binned: f64 = analysis.bins.iter().map(|b| b.count).sum();
        let missing = analysis.missing_bin.map(|b| b.count).unwrap_or(0.0);
        assert!((binned + missing - 10.0).abs() < 1e-9, "Two null-label rows must be dropped");
    }

    #[test]
    fn test_categorical_variable_groups_rare_into_other() {
        let df = df! {
            "default" => [0i32, 0, 1, 1, 0, 0, 1, 1, 0, 1],
            "grade" => ["A", "A", "A", "A", "B", "C", "C", "C", "C", "C"],
        }
        .unwrap();
        let target_values = binary_target_values(&df, "default").unwrap();

        let analysis = bin_categorical_variable(&df, "grade", &target_values, 2).unwrap();

        assert_eq!(analysis.feature_type, FeatureType::Categorical);
        assert!(analysis.bins.is_empty());
        let names: Vec<&str> = analysis.categories.iter().map(|c| c.category.as_str()).collect();
        assert!(names.contains(&"A"));
        assert!(names.contains(&"C"));
        assert!(names.contains(&OTHER_CATEGORY), "B has one row and must fold into OTHER");
        assert!(!names.contains(&"B"));
    }

    #[test]
    fn test_bin_variables_preserves_order_and_fails_on_missing_variable() {
        let df = df! {
            "default" => [0i32, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            "b" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
            "a" => [12.0f64, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        }
        .unwrap();

        let analyses = bin_variables(&df, "default", &["b", "a"], &BinningConfig::default()).unwrap();
        assert_eq!(analyses[0].variable, "b");
        assert_eq!(analyses[1].variable, "a");

        let err = bin_variables(&df, "default", &["a", "zzz"], &BinningConfig::default()).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn test_bin_variables_rejects_single_class_label() {
        let df = df! {
            "default" => [0i32, 0, 0, 0],
            "a" => [1.0f64, 2.0, 3.0, 4.0],
        }
        .unwrap();

        let err = bin_variables(&df, "default", &["a"], &BinningConfig::default()).unwrap_err();
        assert!(err.to_string().contains("both classes"));
    }

    #[test]
    fn test_bins_serialize_open_edges_as_null() {
        let bin = WoeBin {
            lower_bound: 1.0,
            upper_bound: f64::INFINITY,
            events: 1.0,
            non_events: 1.0,
            woe: 0.0,
            iv_contribution: 0.0,
            count: 2.0,
            population_pct: 100.0,
            event_rate: 0.5,
        };

        let json = serde_json::to_value(&bin).unwrap();
        assert_eq!(json["upper_bound"], serde_json::Value::Null);

        let back: WoeBin = serde_json::from_value(json).unwrap();
        assert!(back.upper_bound.is_infinite() && back.upper_bound > 0.0);
        assert_eq!(back.lower_bound, 1.0);
    }
}
