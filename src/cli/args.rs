//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::pipeline::binning::BinningStrategy;
use crate::pipeline::variables::LABEL_COLUMN;
use crate::scoring::OutOfRangePolicy;

pub const DEFAULT_BINS_PATH: &str = "model/woe_bins.json";
pub const DEFAULT_MODEL_PATH: &str = "model/scorecard_model.json";

/// Credit scorecard - WoE binning, logistic training and default-probability scoring
#[derive(Parser, Debug)]
#[command(name = "scorecard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute WoE bins for the scorecard predictors and save them as JSON
    Bin(BinArgs),

    /// Apply saved bins to a raw dataset, writing the `_woe` training table
    Woe(WoeArgs),

    /// Fit the logistic scorecard on a WoE dataset and save the model as JSON
    Train(TrainArgs),

    /// Score a single applicant read from a JSON file
    Score(ScoreArgs),

    /// Run the HTTP scoring service
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BinArgs {
    /// Historical dataset with the predictors and the label (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output path for the bin definitions
    #[arg(short, long, default_value = DEFAULT_BINS_PATH)]
    pub output: PathBuf,

    /// Binary label column (1 = default)
    #[arg(short, long, default_value = LABEL_COLUMN)]
    pub target: String,

    /// Binning strategy.
    /// Options: "cart" (decision tree splits, default) or "quantile" (equal-frequency pre-bins merged by IV loss)
    #[arg(long, default_value = "cart")]
    pub strategy: BinningStrategy,

    /// Maximum number of bins per numeric variable (excluding MISSING)
    #[arg(long, default_value = "8", value_parser = validate_max_bins)]
    pub max_bins: usize,

    /// Minimum bin size as percentage of non-null rows for CART binning (0-100).
    /// Ignored for quantile binning.
    #[arg(long, default_value = "5.0", value_parser = validate_min_bin_pct)]
    pub min_bin_pct: f64,

    /// Minimum rows per category for categorical variables.
    /// Categories with fewer rows are merged into "OTHER".
    #[arg(long, default_value = "5")]
    pub min_category_samples: usize,

    /// Print the bin-level table for every variable
    #[arg(long, default_value = "false")]
    pub show_bins: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug, Clone)]
pub struct WoeArgs {
    /// Raw historical dataset (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Bin definitions produced by `scorecard bin`
    #[arg(short, long, default_value = DEFAULT_BINS_PATH)]
    pub bins: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_woe' suffix (e.g., loans.csv -> loans_woe.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Binary label column carried into the output
    #[arg(short, long, default_value = LABEL_COLUMN)]
    pub target: String,

    /// Number of rows to use for schema inference (CSV only)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl WoeArgs {
    /// Output path, derived from the input when not given explicitly
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| suffixed_path(&self.input, "_woe"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// WoE dataset produced by `scorecard woe`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output path for the fitted model
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub output: PathBuf,

    /// Binary label column (1 = default)
    #[arg(short, long, default_value = LABEL_COLUMN)]
    pub target: String,

    /// Inverse L2 regularization strength (must be positive)
    #[arg(short = 'C', long = "regularization-c", default_value = "1.0", value_parser = validate_positive)]
    pub c: f64,

    /// Upper bound on Newton iterations
    #[arg(long, default_value = "1000", value_parser = validate_max_iter)]
    pub max_iter: usize,

    /// Convergence tolerance on the max-abs gradient
    #[arg(long, default_value = "1e-8", value_parser = validate_positive)]
    pub tol: f64,

    /// Number of rows to use for schema inference (CSV only)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// JSON file holding one applicant record
    pub applicant: PathBuf,

    /// Bin definitions
    #[arg(short, long, default_value = DEFAULT_BINS_PATH)]
    pub bins: PathBuf,

    /// Fitted scorecard model
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// What to do with values outside every trained bin: "neutral" (WoE 0) or "reject"
    #[arg(long, default_value = "neutral")]
    pub out_of_range: OutOfRangePolicy,

    /// Print the service's JSON response instead of styled output
    #[arg(long, default_value = "false")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Bin definitions
    #[arg(short, long, env = "SCORECARD_BINS", default_value = DEFAULT_BINS_PATH)]
    pub bins: PathBuf,

    /// Fitted scorecard model
    #[arg(short, long, env = "SCORECARD_MODEL", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Address to listen on
    #[arg(short, long, env = "SCORECARD_ADDR", default_value = "127.0.0.1:8000")]
    pub addr: SocketAddr,

    /// What to do with values outside every trained bin: "neutral" (WoE 0) or "reject"
    #[arg(long, env = "SCORECARD_OUT_OF_RANGE", default_value = "neutral")]
    pub out_of_range: OutOfRangePolicy,

    /// Allowed CORS origin (repeatable). Any origin is allowed when omitted.
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,
}

/// `dir/stem<suffix>.ext` next to `input`
fn suffixed_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("parquet");
    parent.join(format!("{}{}.{}", stem, suffix, extension))
}

/// Validator for max_bins parameter
fn validate_max_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;

    if value < 1 {
        Err("max_bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for min_bin_pct parameter
fn validate_min_bin_pct(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=100.0).contains(&value) {
        Err(format!(
            "min_bin_pct must be between 0.0 and 100.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}

/// Validator for max_iter parameter
fn validate_max_iter(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;

    if value < 1 {
        Err("max_iter must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for strictly positive floats (C, tolerance)
fn validate_positive(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("value must be a positive number, got {}", value))
    }
}
