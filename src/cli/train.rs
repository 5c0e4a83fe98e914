//! `scorecard train` - fit and save the logistic scorecard

use std::time::Instant;

use anyhow::{Context, Result};

use super::TrainArgs;
use crate::pipeline::{load_dataset_with_progress, train_scorecard, TrainConfig};
use crate::report::display_training_summary;
use crate::utils::{
    create_spinner, finish_with_failure, finish_with_success, print_banner, print_completion, print_config, print_info,
    print_step_header, print_success,
};

pub fn run_train(args: &TrainArgs) -> Result<()> {
    let start = Instant::now();
    let config = TrainConfig {
        c: args.c,
        max_iter: args.max_iter,
        tol: args.tol,
    };

    print_banner(env!("CARGO_PKG_VERSION"), "train");
    print_config(
        &args.input,
        &args.output,
        &[
            ("Label", args.target.clone()),
            ("C", config.c.to_string()),
            ("Max iterations", config.max_iter.to_string()),
            ("Tolerance", format!("{:e}", config.tol)),
            ("Class weights", "balanced".to_string()),
        ],
    );

    print_step_header(1, "Load WoE dataset");
    let (df, rows, cols, _) = load_dataset_with_progress(&args.input, args.infer_schema_length)?;
    print_info(&format!("{} rows x {} columns", rows, cols));

    print_step_header(2, "Fit logistic regression");
    let spinner = create_spinner("Running Newton solver...");
    let model = match train_scorecard(&df, &args.target, &config, Some(&args.input)) {
        Ok(model) => {
            finish_with_success(&spinner, &format!("Converged in {} iterations", model.fit.iterations));
            model
        }
        Err(e) => {
            finish_with_failure(&spinner, "Solver stopped");
            return Err(e.context("Training failed, no model was written"));
        }
    };

    display_training_summary(&model);

    print_step_header(3, "Save model");
    model
        .save(&args.output)
        .with_context(|| format!("Failed to save model to {}", args.output.display()))?;
    print_success(&format!("Saved {}", args.output.display()));

    print_completion(&format!(
        "Training complete in {:.1}s",
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}
