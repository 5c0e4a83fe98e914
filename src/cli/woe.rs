//! `scorecard woe` - apply saved bins to a raw dataset

use anyhow::{Context, Result};

use super::WoeArgs;
use crate::artifacts::BinDefinitionSet;
use crate::pipeline::{apply_bins, load_dataset_with_progress, save_dataset};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_info, print_step_header, print_success, print_warning,
};

pub fn run_woe(args: &WoeArgs) -> Result<()> {
    let output = args.output_path();

    print_banner(env!("CARGO_PKG_VERSION"), "woe");
    print_config(
        &args.input,
        &output,
        &[
            ("Bins", args.bins.display().to_string()),
            ("Label", args.target.clone()),
        ],
    );

    print_step_header(1, "Load inputs");
    let bins = BinDefinitionSet::load(&args.bins)
        .with_context(|| format!("Failed to load bin definitions from {}", args.bins.display()))?;
    let (df, rows, cols, _) = load_dataset_with_progress(&args.input, args.infer_schema_length)?;
    print_info(&format!("{} rows x {} columns", rows, cols));

    print_step_header(2, "Apply bins");
    let spinner = create_spinner("Mapping values to WoE...");
    let (mut woe_df, substitutions) = apply_bins(&df, &bins, &args.target)?;

    if substitutions.is_empty() {
        finish_with_success(&spinner, "Every value matched a bin");
    } else {
        finish_with_warning(&spinner, "Some values matched no bin and were set to WoE 0");
        for (variable, count) in &substitutions {
            print_warning(&format!("{}: {} value(s) outside trained bins", variable, count));
        }
    }

    print_step_header(3, "Save WoE dataset");
    save_dataset(&mut woe_df, &output)?;
    print_success(&format!(
        "Saved {} ({} columns)",
        output.display(),
        woe_df.width()
    ));

    print_completion("WoE dataset ready for training");
    Ok(())
}
