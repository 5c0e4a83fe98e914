//! scorecard: credit scorecard CLI
//!
//! `bin` -> `woe` -> `train` builds the artifacts offline; `serve` and
//! `score` use them to score applicants.

use anyhow::Result;
use clap::Parser;

use scorecard::cli::{self, Cli};
use scorecard::utils::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: {}", e);
    }

    cli::run(&cli)
}
