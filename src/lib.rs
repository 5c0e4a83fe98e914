//! Credit scorecard library
//!
//! WoE binning of applicant variables, a balanced L2 logistic scorecard
//! trained on the WoE features, and single-applicant default-probability
//! scoring over HTTP or the command line.

pub mod artifacts;
pub mod cli;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod server;
pub mod utils;
