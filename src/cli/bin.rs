//! `scorecard bin` - compute and save WoE bin definitions

use std::time::Instant;

use anyhow::{Context, Result};

use super::BinArgs;
use crate::artifacts::{ArtifactMetadata, BinDefinitionSet};
use crate::pipeline::{bin_variables, load_dataset_with_progress, require_columns, BinningConfig, PREDICTORS};
use crate::report::display_binning_summary;
use crate::utils::{
    print_banner, print_completion, print_config, print_count, print_info, print_step_header,
    print_success,
};

pub fn run_bin(args: &BinArgs) -> Result<()> {
    let start = Instant::now();
    let config = BinningConfig {
        strategy: args.strategy,
        max_bins: args.max_bins,
        min_bin_pct: args.min_bin_pct,
        min_category_samples: args.min_category_samples,
    };

    print_banner(env!("CARGO_PKG_VERSION"), "bin");
    print_config(
        &args.input,
        &args.output,
        &[
            ("Label", args.target.clone()),
            ("Strategy", config.strategy.to_string()),
            ("Max bins", config.max_bins.to_string()),
            ("Min bin size", format!("{:.1}%", config.min_bin_pct)),
            ("Min category rows", config.min_category_samples.to_string()),
        ],
    );

    print_step_header(1, "Load dataset");
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(&args.input, args.infer_schema_length)?;
    print_info(&format!("{} rows x {} columns ({:.2} MB)", rows, cols, memory_mb));

    require_columns(&df, &PREDICTORS)?;
    require_columns(&df, &[args.target.as_str()])?;
    print_count("scorecard predictors", PREDICTORS.len(), None);

    print_step_header(2, "Bin variables");
    let variables = bin_variables(&df, &args.target, &PREDICTORS, &config)?;
    display_binning_summary(&variables, args.show_bins);

    print_step_header(3, "Save bin definitions");
    let set = BinDefinitionSet::new(
        ArtifactMetadata::new(Some(&args.input), &args.target),
        config,
        variables,
    );
    set.save(&args.output)
        .with_context(|| format!("Failed to save bin definitions to {}", args.output.display()))?;
    print_success(&format!("Saved {}", args.output.display()));

    tracing::info!(
        output = %args.output.display(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "binning finished"
    );
    print_completion(&format!(
        "Binning complete in {:.1}s",
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}
