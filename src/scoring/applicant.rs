//! Applicant record and its lenient JSON validation
//!
//! Float fields accept any JSON number or a numeric string. Integer fields
//! accept integers, floats without a fractional part, or integer strings.
//! Every failing field is reported, not just the first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::variables::PREDICTORS;

/// Declared type of an applicant field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Int,
}

/// Declared type per predictor, in catalogue order
pub const FIELD_KINDS: [FieldKind; 11] = [
    FieldKind::Float, // int_rate
    FieldKind::Int,   // term
    FieldKind::Float, // dti
    FieldKind::Int,   // fico_range_high
    FieldKind::Int,   // acc_open_past_24mths
    FieldKind::Int,   // mo_sin_old_rev_tl_op
    FieldKind::Float, // bc_open_to_buy
    FieldKind::Int,   // mort_acc
    FieldKind::Float, // total_bc_limit
    FieldKind::Float, // avg_cur_bal
    FieldKind::Int,   // open_rv_24m
];

/// One loan applicant's raw feature values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub int_rate: f64,
    pub term: i64,
    pub dti: f64,
    pub fico_range_high: i64,
    pub acc_open_past_24mths: i64,
    pub mo_sin_old_rev_tl_op: i64,
    pub bc_open_to_buy: f64,
    pub mort_acc: i64,
    pub total_bc_limit: f64,
    pub avg_cur_bal: f64,
    pub open_rv_24m: i64,
}

/// One field validation failure with its location and type tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location, e.g. `["body", "dti"]`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    fn field(name: &str, msg: &str, kind: &str) -> Self {
        Self::new(&["body", name], msg, kind)
    }
}

#[derive(Debug, Clone, Copy)]
enum Parsed {
    Float(f64),
    Int(i64),
}

impl ApplicantRecord {
    /// Validate an arbitrary JSON value into a record.
    ///
    /// Unknown keys are ignored.
    pub fn from_json_value(value: &Value) -> Result<Self, Vec<FieldError>> {
        let object = match value {
            Value::Object(map) => map,
            _ => {
                return Err(vec![FieldError::new(
                    &["body"],
                    "Input should be a valid dictionary or object",
                    "model_attributes_type",
                )])
            }
        };

        let mut parsed = Vec::with_capacity(PREDICTORS.len());
        let mut errors = Vec::new();

        for (name, kind) in PREDICTORS.iter().zip(FIELD_KINDS) {
            match parse_field(object, name, kind) {
                Ok(v) => parsed.push(v),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let float = |i: usize| match parsed[i] {
            Parsed::Float(v) => v,
            Parsed::Int(v) => v as f64,
        };
        let int = |i: usize| match parsed[i] {
            Parsed::Int(v) => v,
            Parsed::Float(v) => v as i64,
        };

        Ok(Self {
            int_rate: float(0),
            term: int(1),
            dti: float(2),
            fico_range_high: int(3),
            acc_open_past_24mths: int(4),
            mo_sin_old_rev_tl_op: int(5),
            bc_open_to_buy: float(6),
            mort_acc: int(7),
            total_bc_limit: float(8),
            avg_cur_bal: float(9),
            open_rv_24m: int(10),
        })
    }

    /// Field values as floats, in catalogue order
    pub fn values(&self) -> [(&'static str, f64); 11] {
        [
            (PREDICTORS[0], self.int_rate),
            (PREDICTORS[1], self.term as f64),
            (PREDICTORS[2], self.dti),
            (PREDICTORS[3], self.fico_range_high as f64),
            (PREDICTORS[4], self.acc_open_past_24mths as f64),
            (PREDICTORS[5], self.mo_sin_old_rev_tl_op as f64),
            (PREDICTORS[6], self.bc_open_to_buy),
            (PREDICTORS[7], self.mort_acc as f64),
            (PREDICTORS[8], self.total_bc_limit),
            (PREDICTORS[9], self.avg_cur_bal),
            (PREDICTORS[10], self.open_rv_24m as f64),
        ]
    }
}

fn parse_field(object: &Map<String, Value>, name: &str, kind: FieldKind) -> Result<Parsed, FieldError> {
    let value = object
        .get(name)
        .ok_or_else(|| FieldError::field(name, "Field required", "missing"))?;

    match kind {
        FieldKind::Float => parse_float(value)
            .map(Parsed::Float)
            .map_err(|(msg, kind)| FieldError::field(name, msg, kind)),
        FieldKind::Int => parse_int(value)
            .map(Parsed::Int)
            .map_err(|(msg, kind)| FieldError::field(name, msg, kind)),
    }
}

fn parse_float(value: &Value) -> Result<f64, (&'static str, &'static str)> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or(("Input should be a valid number", "float_type")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or((
                "Input should be a valid number, unable to parse string as a number",
                "float_parsing",
            )),
        _ => Err(("Input should be a valid number", "float_type")),
    }
}

fn parse_int(value: &Value) -> Result<i64, (&'static str, &'static str)> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                    Ok(v as i64)
                }
                Some(v) if v.is_finite() && v.fract() != 0.0 => Err((
                    "Input should be a valid integer, got a number with a fractional part",
                    "int_from_float",
                )),
                _ => Err(("Input should be a valid integer", "int_type")),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            (
                "Input should be a valid integer, unable to parse string as an integer",
                "int_parsing",
            )
        }),
        _ => Err(("Input should be a valid integer", "int_type")),
    }
}
