//! Training summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::artifacts::ScorecardModel;

/// Intercept and one coefficient per feature
pub fn coefficient_table(model: &ScorecardModel) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Coefficient").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![
        Cell::new("(intercept)").add_attribute(Attribute::Italic),
        Cell::new(format!("{:+.6}", model.intercept)).set_alignment(CellAlignment::Right),
    ]);

    for (name, coef) in model.feature_names.iter().zip(&model.coefficients) {
        // WoE is positive for riskier bins, so a negative weight is unusual
        let color = if *coef < 0.0 { Color::Yellow } else { Color::White };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:+.6}", coef))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Solver and fit diagnostics
pub fn fit_table(model: &ScorecardModel) -> Table {
    let fit = &model.fit;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![Cell::new("Rows"), Cell::new(fit.n_samples)]);
    table.add_row(vec![Cell::new("Defaults"), Cell::new(fit.n_events)]);
    table.add_row(vec![
        Cell::new("Class weights (0 / 1)"),
        Cell::new(format!(
            "{:.4} / {:.4}",
            model.class_weights.non_event, model.class_weights.event
        )),
    ]);
    table.add_row(vec![Cell::new("C"), Cell::new(model.regularization_c)]);
    table.add_row(vec![Cell::new("Newton iterations"), Cell::new(fit.iterations)]);
    table.add_row(vec![
        Cell::new("Weighted log loss"),
        Cell::new(format!("{:.6}", fit.log_loss)),
    ]);
    table.add_row(vec![
        Cell::new("AUC"),
        Cell::new(format!("{:.4}", fit.auc))
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Gini"), Cell::new(format!("{:.4}", fit.gini))]);

    table
}

pub fn display_training_summary(model: &ScorecardModel) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style("TRAINING SUMMARY").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    for line in coefficient_table(model).to_string().lines() {
        println!("    {}", line);
    }
    println!();
    for line in fit_table(model).to_string().lines() {
        println!("    {}", line);
    }
}
