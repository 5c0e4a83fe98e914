//! Pipeline module - offline binning, WoE transformation and training

pub mod binning;
pub mod loader;
pub mod logistic;
pub mod metrics;
pub mod target;
pub mod variables;
pub mod woe;

pub use binning::*;
pub use loader::*;
pub use logistic::{fit_logistic, sigmoid, train_scorecard, LogisticFit, TrainConfig, TrainError};
pub use target::*;
pub use variables::*;
pub use woe::*;
