//! Variable catalogue shared by binning, training and scoring
//!
//! The scorecard is built over a fixed set of eleven applicant predictors.
//! Every stage refers to them through this module so the raw names, the
//! `_woe` training columns and the model's feature order cannot drift apart.

/// Name of the binary label column (1 = default, 0 = repaid)
pub const LABEL_COLUMN: &str = "default";

/// Suffix appended to a raw variable name to form its WOE column name
pub const WOE_SUFFIX: &str = "_woe";

/// Raw predictors in the order the scorecard consumes them
pub const PREDICTORS: [&str; 11] = [
    "int_rate",
    "term",
    "dti",
    "fico_range_high",
    "acc_open_past_24mths",
    "mo_sin_old_rev_tl_op",
    "bc_open_to_buy",
    "mort_acc",
    "total_bc_limit",
    "avg_cur_bal",
    "open_rv_24m",
];

/// WOE column name for a raw variable (`dti` -> `dti_woe`)
pub fn woe_column(raw: &str) -> String {
    format!("{}{}", raw, WOE_SUFFIX)
}

/// WOE column names for every predictor, in catalogue order
pub fn woe_columns() -> Vec<String> {
    PREDICTORS.iter().map(|name| woe_column(name)).collect()
}

/// Columns from `required` that are absent in `available`
pub fn missing_columns<S: AsRef<str>>(available: &[String], required: &[S]) -> Vec<String> {
    required
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| !available.iter().any(|a| a == c))
        .map(|c| c.to_string())
        .collect()
}
