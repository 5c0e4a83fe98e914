//! Logistic regression trainer for the scorecard
//!
//! Fits `P(default) = sigmoid(b0 + w . x)` over the WoE columns with balanced
//! class weights and an L2 penalty on `w` (the intercept is not penalized).
//! The objective, scaled by the total sample weight `S`, is
//!
//! ```text
//! f(b) = (1/S) * sum_i s_i * logloss_i + ||w||^2 / (2 * C * S)
//! ```
//!
//! and is minimized with a damped Newton method: each step solves the
//! Hessian system by Cholesky and backtracks until the objective decreases.

use std::path::Path;

use anyhow::{Context, Result};
use faer::prelude::*;
use faer::{Mat, Side};
use polars::prelude::*;
use thiserror::Error;

use super::metrics::{gini, weighted_auc};
use super::target::binary_target_values;
use super::variables::{missing_columns, woe_columns};
use crate::artifacts::{ArtifactMetadata, ClassWeights, FitSummary, ScorecardModel};

/// Armijo sufficient-decrease constant
const ARMIJO_C: f64 = 1e-4;

/// Step halvings before the line search gives up
const MAX_BACKTRACKS: usize = 40;

/// Errors callers may want to match on when training fails
#[derive(Debug, Error)]
pub enum TrainError {
    /// One or more required WoE columns are absent.
    #[error("training data is missing column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A feature column has null or NaN values among the labelled rows.
    #[error("column '{column}' contains {count} null or NaN value(s)")]
    NullValues { column: String, count: usize },

    /// Both classes are needed to fit the model.
    #[error("training data must contain both classes (found {events} events, {non_events} non-events)")]
    SingleClass { events: usize, non_events: usize },

    /// The gradient did not reach tolerance within the iteration bound.
    #[error("solver did not converge within {max_iter} iterations (gradient norm {gradient_norm:.3e})")]
    NotConverged { max_iter: usize, gradient_norm: f64 },

    /// The Newton system could not be factorized.
    #[error("Hessian is not positive definite at iteration {iteration}")]
    SingularHessian { iteration: usize },
}

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Inverse regularization strength (larger means weaker penalty)
    pub c: f64,
    pub max_iter: usize,
    /// Convergence threshold on the max-abs gradient
    pub tol: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-8,
        }
    }
}

/// Raw solver output
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub iterations: usize,
    /// Sample-weighted mean log loss (no penalty term)
    pub log_loss: f64,
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^z) without overflow
fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Weighted logistic problem over column-major features
struct Problem<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [i32],
    weights: &'a [f64],
    total_weight: f64,
    penalty: f64,
}

impl Problem<'_> {
    fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Parameter vector layout: `[b0, w_1, ..., w_p]`
    fn linear(&self, beta: &[f64], row: usize) -> f64 {
        self.columns
            .iter()
            .zip(&beta[1..])
            .fold(beta[0], |acc, (col, w)| acc + w * col[row])
    }

    fn loss(&self, beta: &[f64]) -> f64 {
        let data: f64 = (0..self.n_rows())
            .map(|i| {
                let z = self.linear(beta, i);
                self.weights[i] * (log1p_exp(z) - self.labels[i] as f64 * z)
            })
            .sum();
        data / self.total_weight
    }

    fn objective(&self, beta: &[f64]) -> f64 {
        let l2: f64 = beta[1..].iter().map(|w| w * w).sum();
        self.loss(beta) + self.penalty * l2 / 2.0
    }

    /// Gradient and Hessian of the objective at `beta`
    fn derivatives(&self, beta: &[f64]) -> (Vec<f64>, Mat<f64>) {
        let n = self.n_rows();
        let k = beta.len();
        let mut grad = vec![0.0; k];
        let mut scaled = Mat::<f64>::zeros(n, k);

        for i in 0..n {
            let p = sigmoid(self.linear(beta, i));
            let residual = self.weights[i] * (p - self.labels[i] as f64) / self.total_weight;
            let curvature = (self.weights[i] * p * (1.0 - p) / self.total_weight).sqrt();

            grad[0] += residual;
            scaled[(i, 0)] = curvature;
            for (j, col) in self.columns.iter().enumerate() {
                grad[j + 1] += residual * col[i];
                scaled[(i, j + 1)] = curvature * col[i];
            }
        }

        let mut hessian = scaled.transpose() * &scaled;
        for j in 1..k {
            grad[j] += self.penalty * beta[j];
            hessian[(j, j)] += self.penalty;
        }

        (grad, hessian)
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |m, v| m.max(v.abs()))
}

/// Fit a weighted, L2-penalized logistic regression.
///
/// `columns` holds one `Vec` per feature, each the length of `labels`.
/// Deterministic: the same inputs always produce the same parameters.
pub fn fit_logistic(
    columns: &[Vec<f64>],
    labels: &[i32],
    weights: &[f64],
    config: &TrainConfig,
) -> Result<LogisticFit, TrainError> {
    let total_weight: f64 = weights.iter().sum();
    let problem = Problem {
        columns,
        labels,
        weights,
        total_weight,
        penalty: 1.0 / (config.c * total_weight),
    };

    let k = columns.len() + 1;
    let mut beta = vec![0.0; k];
    let mut f = problem.objective(&beta);

    for iteration in 0..config.max_iter {
        let (grad, hessian) = problem.derivatives(&beta);
        let gradient_norm = max_abs(&grad);

        tracing::debug!(iteration, objective = f, gradient_norm, "newton step");

        if gradient_norm <= config.tol {
            return Ok(finish(&problem, beta, iteration));
        }

        let cholesky = hessian
            .cholesky(Side::Lower)
            .map_err(|_| TrainError::SingularHessian { iteration })?;
        let rhs = Mat::from_fn(k, 1, |i, _| grad[i]);
        let step = cholesky.solve(&rhs);
        let direction: Vec<f64> = (0..k).map(|i| step[(i, 0)]).collect();

        // Directional derivative along -direction (negative for a descent step)
        let slope: f64 = -grad.iter().zip(&direction).map(|(g, d)| g * d).sum::<f64>();
        let slack = 4.0 * f64::EPSILON * (1.0 + f.abs());

        let mut t = 1.0;
        let mut accepted = false;
        for _ in 0..MAX_BACKTRACKS {
            let candidate: Vec<f64> = beta.iter().zip(&direction).map(|(b, d)| b - t * d).collect();
            let f_new = problem.objective(&candidate);
            if f_new <= f + ARMIJO_C * t * slope + slack {
                beta = candidate;
                f = f_new;
                accepted = true;
                break;
            }
            t /= 2.0;
        }

        if !accepted {
            tracing::debug!(iteration, "line search made no progress");
            return Err(TrainError::NotConverged {
                max_iter: config.max_iter,
                gradient_norm,
            });
        }
    }

    let (grad, _) = problem.derivatives(&beta);
    let gradient_norm = max_abs(&grad);
    if gradient_norm <= config.tol {
        Ok(finish(&problem, beta, config.max_iter))
    } else {
        Err(TrainError::NotConverged {
            max_iter: config.max_iter,
            gradient_norm,
        })
    }
}

fn finish(problem: &Problem<'_>, beta: Vec<f64>, iterations: usize) -> LogisticFit {
    LogisticFit {
        intercept: beta[0],
        log_loss: problem.loss(&beta),
        coefficients: beta[1..].to_vec(),
        iterations,
    }
}

/// Train the scorecard on a WoE dataset.
///
/// The frame must carry every `_woe` column of the catalogue and the binary
/// label. Rows with a null label are dropped with a warning; nulls in a WoE
/// column fail. Failures that callers can act on are [`TrainError`]s inside
/// the returned `anyhow::Error`.
pub fn train_scorecard(
    df: &DataFrame,
    label: &str,
    config: &TrainConfig,
    source_file: Option<&Path>,
) -> Result<ScorecardModel> {
    let feature_names = woe_columns();

    let available: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut missing = missing_columns(&available, &feature_names);
    missing.extend(missing_columns(&available, &[label]));
    if !missing.is_empty() {
        return Err(TrainError::MissingColumns(missing).into());
    }

    let target_values = binary_target_values(df, label)?;
    let keep: Vec<usize> = target_values
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.map(|_| i))
        .collect();
    let dropped = target_values.len() - keep.len();
    if dropped > 0 {
        tracing::warn!(rows = dropped, "dropping rows with a null label");
    }

    let labels: Vec<i32> = keep.iter().filter_map(|&i| target_values[i]).collect();

    let mut columns = Vec::with_capacity(feature_names.len());
    for name in &feature_names {
        let floats = df
            .column(name)?
            .cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is not numeric", name))?;
        let ca = floats.f64()?;

        let mut values = Vec::with_capacity(keep.len());
        let mut nulls = 0usize;
        for &i in &keep {
            match ca.get(i) {
                Some(v) if !v.is_nan() => values.push(v),
                _ => nulls += 1,
            }
        }
        if nulls > 0 {
            return Err(TrainError::NullValues {
                column: name.clone(),
                count: nulls,
            }
            .into());
        }
        columns.push(values);
    }

    let n_events = labels.iter().filter(|&&y| y == 1).count();
    let n_non_events = labels.len() - n_events;
    if n_events == 0 || n_non_events == 0 {
        return Err(TrainError::SingleClass {
            events: n_events,
            non_events: n_non_events,
        }
        .into());
    }

    let class_weights = ClassWeights::balanced(n_events, n_non_events);
    let weights: Vec<f64> = labels.iter().map(|&y| class_weights.for_label(y)).collect();

    tracing::info!(
        rows = labels.len(),
        events = n_events,
        c = config.c,
        max_iter = config.max_iter,
        "fitting logistic scorecard"
    );

    let fit = fit_logistic(&columns, &labels, &weights, config)?;

    let mut scored: Vec<(f64, i32, f64)> = (0..labels.len())
        .map(|i| {
            let z = columns
                .iter()
                .zip(&fit.coefficients)
                .fold(fit.intercept, |acc, (col, w)| acc + w * col[i]);
            (z, labels[i], 1.0)
        })
        .collect();
    let train_gini = gini(scored.clone());
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let auc = weighted_auc(&scored);

    tracing::info!(iterations = fit.iterations, log_loss = fit.log_loss, auc, "solver converged");

    Ok(ScorecardModel {
        metadata: ArtifactMetadata::new(source_file, label),
        feature_names,
        coefficients: fit.coefficients,
        intercept: fit.intercept,
        regularization_c: config.c,
        class_weights,
        fit: FitSummary {
            iterations: fit.iterations,
            converged: true,
            log_loss: fit.log_loss,
            auc,
            gini: train_gini,
            n_samples: labels.len(),
            n_events,
        },
    })
}
