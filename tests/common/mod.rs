//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tempfile::TempDir;

use scorecard::artifacts::{
    ArtifactMetadata, BinDefinitionSet, ClassWeights, FitSummary, ScorecardModel,
};
use scorecard::pipeline::{
    woe_columns, BinningConfig, FeatureType, VariableBinning, WoeBin, LABEL_COLUMN,
};

/// Synthetic loan book with every predictor and a `default` label.
///
/// Defaults are drawn from a logistic model of the predictors, so rate, term,
/// dti and FICO carry real signal. About 5% of `mort_acc` is null.
pub fn synthetic_loans(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut int_rate = Vec::with_capacity(rows);
    let mut term = Vec::with_capacity(rows);
    let mut dti = Vec::with_capacity(rows);
    let mut fico = Vec::with_capacity(rows);
    let mut acc_open = Vec::with_capacity(rows);
    let mut mo_sin = Vec::with_capacity(rows);
    let mut bc_open = Vec::with_capacity(rows);
    let mut mort_acc = Vec::with_capacity(rows);
    let mut total_bc = Vec::with_capacity(rows);
    let mut avg_cur = Vec::with_capacity(rows);
    let mut open_rv = Vec::with_capacity(rows);
    let mut default = Vec::with_capacity(rows);

    for _ in 0..rows {
        let rate: f64 = rng.gen_range(5.0..30.0);
        let months: i64 = if rng.gen_bool(0.3) { 60 } else { 36 };
        let ratio: f64 = rng.gen_range(0.0..40.0);
        let score: i64 = rng.gen_range(620..850);
        let opened: i64 = rng.gen_range(0..12);
        let oldest: i64 = rng.gen_range(12..400);
        let open_to_buy: f64 = rng.gen_range(0.0..30000.0);
        let mortgages: Option<i64> = if rng.gen_bool(0.05) {
            None
        } else {
            Some(rng.gen_range(0..6))
        };
        let limit: f64 = rng.gen_range(1000.0..60000.0);
        let balance: f64 = rng.gen_range(500.0..40000.0);
        let revolving: i64 = rng.gen_range(0..10);

        let long_term = if months == 60 { 0.5 } else { 0.0 };
        let z = -1.5
            + 0.12 * (rate - 15.0)
            + long_term
            + 0.03 * (ratio - 20.0)
            - 0.01 * (score as f64 - 735.0)
            + 0.1 * (opened as f64 - 5.0)
            - 0.002 * (oldest as f64 - 200.0)
            - 0.2 * (mortgages.unwrap_or(1) as f64 - 2.0);
        let p = 1.0 / (1.0 + (-z).exp());

        int_rate.push(rate);
        term.push(months);
        dti.push(ratio);
        fico.push(score);
        acc_open.push(opened);
        mo_sin.push(oldest);
        bc_open.push(open_to_buy);
        mort_acc.push(mortgages);
        total_bc.push(limit);
        avg_cur.push(balance);
        open_rv.push(revolving);
        default.push(rng.gen_bool(p) as i32);
    }

    df! {
        "int_rate" => int_rate,
        "term" => term,
        "dti" => dti,
        "fico_range_high" => fico,
        "acc_open_past_24mths" => acc_open,
        "mo_sin_old_rev_tl_op" => mo_sin,
        "bc_open_to_buy" => bc_open,
        "mort_acc" => mort_acc,
        "total_bc_limit" => total_bc,
        "avg_cur_bal" => avg_cur,
        "open_rv_24m" => open_rv,
        LABEL_COLUMN => default,
    }
    .unwrap()
}

/// Applicant that lands in a known bin of every fixture variable
pub fn reference_applicant() -> Value {
    json!({
        "int_rate": 13.5,
        "term": 36,
        "dti": 18.2,
        "fico_range_high": 700,
        "acc_open_past_24mths": 2,
        "mo_sin_old_rev_tl_op": 120,
        "bc_open_to_buy": 5000.0,
        "mort_acc": 1,
        "total_bc_limit": 10000.0,
        "avg_cur_bal": 3000.0,
        "open_rv_24m": 1
    })
}

/// Decision value of [`reference_applicant`] under the fixture artifacts.
///
/// All WoEs and coefficients are dyadic, so this sum is exact.
pub const REFERENCE_Z: f64 = 0.140625;

/// Numeric binning from lower edges; the last bin is open-ended
pub fn numeric_binning(name: &str, lowers: &[f64], woes: &[f64]) -> VariableBinning {
    let bins = lowers
        .iter()
        .zip(woes)
        .enumerate()
        .map(|(i, (&lower, &woe))| WoeBin {
            lower_bound: lower,
            upper_bound: lowers.get(i + 1).copied().unwrap_or(f64::INFINITY),
            events: 10.0,
            non_events: 40.0,
            woe,
            iv_contribution: 0.01,
            count: 50.0,
            population_pct: 100.0 / lowers.len() as f64,
            event_rate: 0.2,
        })
        .collect();

    VariableBinning {
        variable: name.to_string(),
        feature_type: FeatureType::Numeric,
        bins,
        categories: Vec::new(),
        missing_bin: None,
        iv: 0.05,
        gini: 0.1,
    }
}

/// Hand-built bin definitions with dyadic WoEs
pub fn fixture_bins() -> BinDefinitionSet {
    let variables = vec![
        numeric_binning("int_rate", &[5.0, 10.0, 15.0], &[-0.5, 0.25, 0.75]),
        numeric_binning("term", &[36.0, 60.0], &[-0.25, 0.5]),
        numeric_binning("dti", &[0.0, 10.0, 20.0], &[-0.375, 0.125, 0.5]),
        numeric_binning("fico_range_high", &[600.0, 680.0, 740.0], &[0.5, 0.0625, -0.5]),
        numeric_binning("acc_open_past_24mths", &[0.0, 3.0, 6.0], &[-0.125, 0.25, 0.5]),
        numeric_binning("mo_sin_old_rev_tl_op", &[0.0, 100.0, 200.0], &[0.25, -0.0625, -0.25]),
        numeric_binning("bc_open_to_buy", &[0.0, 2000.0, 10000.0], &[0.375, -0.125, -0.5]),
        numeric_binning("mort_acc", &[0.0, 1.0, 3.0], &[0.125, -0.125, -0.25]),
        numeric_binning("total_bc_limit", &[0.0, 5000.0, 20000.0], &[0.25, -0.25, -0.5]),
        numeric_binning("avg_cur_bal", &[0.0, 2500.0, 10000.0], &[0.125, -0.125, -0.375]),
        numeric_binning("open_rv_24m", &[0.0, 2.0, 5.0], &[-0.125, 0.125, 0.375]),
    ];

    BinDefinitionSet::new(
        ArtifactMetadata::new(None, LABEL_COLUMN),
        BinningConfig::default(),
        variables,
    )
}

/// Hand-built model over the catalogue's WoE columns
pub fn fixture_model() -> ScorecardModel {
    ScorecardModel {
        metadata: ArtifactMetadata::new(None, LABEL_COLUMN),
        feature_names: woe_columns(),
        coefficients: vec![0.5, 1.0, 0.75, 1.0, 0.5, 0.25, 0.5, 0.25, 0.5, 0.5, 0.25],
        intercept: 0.5,
        regularization_c: 1.0,
        class_weights: ClassWeights::balanced(200, 800),
        fit: FitSummary {
            iterations: 6,
            converged: true,
            log_loss: 0.61,
            auc: 0.7,
            gini: 0.4,
            n_samples: 1000,
            n_events: 200,
        },
    }
}

/// Write the fixture artifacts into a temp directory
pub fn write_fixture_artifacts() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let bins_path = temp_dir.path().join("woe_bins.json");
    let model_path = temp_dir.path().join("scorecard_model.json");

    fixture_bins().save(&bins_path).unwrap();
    fixture_model().save(&model_path).unwrap();

    (temp_dir, bins_path, model_path)
}

/// Random applicant drawn across (and a little beyond) the synthetic ranges
pub fn random_applicant(rng: &mut StdRng) -> Value {
    json!({
        "int_rate": rng.gen_range(0.0..40.0),
        "term": if rng.gen_bool(0.5) { 36 } else { 60 },
        "dti": rng.gen_range(-5.0..60.0),
        "fico_range_high": rng.gen_range(500..860),
        "acc_open_past_24mths": rng.gen_range(0..20),
        "mo_sin_old_rev_tl_op": rng.gen_range(0..600),
        "bc_open_to_buy": rng.gen_range(0.0..50000.0),
        "mort_acc": rng.gen_range(0..10),
        "total_bc_limit": rng.gen_range(0.0..90000.0),
        "avg_cur_bal": rng.gen_range(0.0..60000.0),
        "open_rv_24m": rng.gen_range(0..15)
    })
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("loans.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Write a JSON value to `name` inside `dir`
pub fn write_json_file(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}
