//! CLI module - argument parsing and subcommand runners

mod args;
pub mod bin;
pub mod score;
pub mod serve;
pub mod train;
pub mod woe;

pub use args::*;
pub use bin::run_bin;
pub use score::run_score;
pub use serve::run_serve;
pub use train::run_train;
pub use woe::run_woe;

use anyhow::Result;

/// Dispatch a parsed command line
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Bin(args) => run_bin(args),
        Commands::Woe(args) => run_woe(args),
        Commands::Train(args) => run_train(args),
        Commands::Score(args) => run_score(args),
        Commands::Serve(args) => run_serve(args),
    }
}
