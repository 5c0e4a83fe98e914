//! Report module - terminal summaries for the offline commands

pub mod binning_summary;
pub mod training_summary;

pub use binning_summary::*;
pub use training_summary::*;
