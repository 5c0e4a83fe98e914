//! `scorecard score` - score one applicant from a JSON file

use anyhow::{Context, Result};
use console::style;
use serde_json::Value;

use super::ScoreArgs;
use crate::scoring::{ScoringContext, ScoringError};
use crate::server::ScoreResponse;
use crate::utils::print_warning;

pub fn run_score(args: &ScoreArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.applicant)
        .with_context(|| format!("Failed to read applicant file {}", args.applicant.display()))?;
    let body: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Applicant file {} is not valid JSON", args.applicant.display()))?;

    let ctx = ScoringContext::load(&args.bins, &args.model, args.out_of_range)
        .context("Failed to load scoring artifacts")?;

    let outcome = match ctx.score_json(&body) {
        Ok(outcome) => outcome,
        Err(ScoringError::Validation(errors)) => {
            for e in &errors {
                eprintln!("    {} {}: {}", style("✗").red().bold(), e.loc.join("."), e.msg);
            }
            anyhow::bail!("Applicant record failed validation ({} field(s))", errors.len());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        let response = ScoreResponse {
            default_probability: outcome.probability,
            risk_band: outcome.risk_band,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    println!(
        "    {} {}",
        style("Default probability:").white().bold(),
        style(format!("{:.6}", outcome.probability)).cyan().bold()
    );
    println!(
        "    {} {}",
        style("Risk band:").white().bold(),
        style(outcome.risk_band).yellow()
    );

    for sub in &outcome.substitutions {
        print_warning(&format!(
            "{} = {} is outside the trained bins (scored with WoE 0)",
            sub.field, sub.value
        ));
    }
    println!();

    Ok(())
}
