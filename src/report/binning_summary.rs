//! Binning summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::binning::{FeatureType, VariableBinning};

/// Conventional IV strength label
pub fn iv_strength(iv: f64) -> &'static str {
    if iv < 0.02 {
        "unpredictive"
    } else if iv < 0.1 {
        "weak"
    } else if iv < 0.3 {
        "medium"
    } else if iv < 0.5 {
        "strong"
    } else {
        "suspicious"
    }
}

fn iv_color(iv: f64) -> Color {
    match iv_strength(iv) {
        "unpredictive" => Color::Red,
        "weak" => Color::Yellow,
        "suspicious" => Color::Magenta,
        _ => Color::Green,
    }
}

fn format_edge(value: f64) -> String {
    if value.is_infinite() {
        let label = if value > 0.0 { "+inf" } else { "-inf" };
        label.to_string()
    } else {
        format!("{}", value)
    }
}

/// One row per variable: bin count, MISSING flag, IV and Gini
pub fn binning_table(variables: &[VariableBinning]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Variable").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Bins").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
        Cell::new("IV").add_attribute(Attribute::Bold),
        Cell::new("Strength").add_attribute(Attribute::Bold),
        Cell::new("Gini").add_attribute(Attribute::Bold),
    ]);

    for var in variables {
        let (kind, bins) = match var.feature_type {
            FeatureType::Numeric => ("numeric", var.bins.len()),
            FeatureType::Categorical => ("categorical", var.categories.len()),
        };
        let missing = var
            .missing_bin
            .as_ref()
            .map(|m| format!("{:.1}%", m.population_pct))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&var.variable),
            Cell::new(kind),
            Cell::new(bins).set_alignment(CellAlignment::Right),
            Cell::new(missing).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", var.iv))
                .fg(iv_color(var.iv))
                .set_alignment(CellAlignment::Right),
            Cell::new(iv_strength(var.iv)).fg(iv_color(var.iv)),
            Cell::new(format!("{:.4}", var.gini)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Bin-level detail for one variable
pub fn bin_detail_table(var: &VariableBinning) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Bin").add_attribute(Attribute::Bold),
        Cell::new("Count").add_attribute(Attribute::Bold),
        Cell::new("Pop %").add_attribute(Attribute::Bold),
        Cell::new("Event rate").add_attribute(Attribute::Bold),
        Cell::new("WoE").add_attribute(Attribute::Bold),
        Cell::new("IV").add_attribute(Attribute::Bold),
    ]);

    let mut push = |label: String, count: f64, pct: f64, rate: f64, woe: f64, iv: f64| {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", pct)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", rate)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:+.4}", woe)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", iv)).set_alignment(CellAlignment::Right),
        ]);
    };

    for bin in &var.bins {
        push(
            format!("[{}, {})", format_edge(bin.lower_bound), format_edge(bin.upper_bound)),
            bin.count,
            bin.population_pct,
            bin.event_rate,
            bin.woe,
            bin.iv_contribution,
        );
    }
    for cat in &var.categories {
        push(
            cat.category.clone(),
            cat.count,
            cat.population_pct,
            cat.event_rate,
            cat.woe,
            cat.iv_contribution,
        );
    }
    if let Some(m) = &var.missing_bin {
        push(
            "MISSING".to_string(),
            m.count,
            m.population_pct,
            m.event_rate,
            m.woe,
            m.iv_contribution,
        );
    }

    table
}

/// Print the variable summary, and each variable's bins when `show_bins`
pub fn display_binning_summary(variables: &[VariableBinning], show_bins: bool) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style("BINNING SUMMARY").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    for line in binning_table(variables).to_string().lines() {
        println!("    {}", line);
    }

    if show_bins {
        for var in variables {
            println!();
            println!("      {}", style(&var.variable).yellow().bold());
            for line in bin_detail_table(var).to_string().lines() {
                println!("      {}", line);
            }
        }
    }
}
