/// Output formatting: terminal summary, JSON, curve CSV and event catalog.
use h0live_core::{AnalysisResult, CatalogEntry};
use std::fmt::Write as _;
use std::path::Path;

use crate::bail;

/// `90` for 0.9, `68.3` for 0.6827.
fn format_percent(level: f64) -> String {
    let pct = level * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{pct:.0}")
    } else {
        format!("{pct:.1}")
    }
}

/// The headline measurement, e.g. `H0 = 68.8 +3.2 -2.9 km s^-1 Mpc^-1 (90% CI)`.
pub fn format_measurement(result: &AnalysisResult) -> String {
    let (plus, minus) = result.interval.error_bars();
    format!(
        "H0 = {:.1} +{:.1} -{:.1} km s^-1 Mpc^-1 ({}% CI)",
        result.interval.map,
        plus,
        minus,
        format_percent(result.level),
    )
}

/// Print the analysis as human-readable text.
pub fn print_summary(result: &AnalysisResult) {
    println!("{}", format_measurement(result));
    println!(
        "HDI [{:.2}, {:.2}], MAP {:.2} | prior: {} | events: {}",
        result.interval.lower,
        result.interval.upper,
        result.interval.map,
        result.prior,
        result.events.join(", "),
    );

    for band in &result.reference_bands {
        println!(
            "{:<6} H0 = {:.2} ± {:.2} km s^-1 Mpc^-1 [{:.2}, {:.2}]",
            band.name,
            band.center,
            band.spread,
            band.lower(),
            band.upper(),
        );
    }

    if !result.diagnostics.converged {
        println!(
            "Warning: HDI search stopped after {} iterations without converging",
            result.diagnostics.iterations,
        );
    }
}

/// Print results as JSON.
pub fn print_json(result: &AnalysisResult) {
    let json = serde_json::to_string_pretty(result)
        .unwrap_or_else(|e| bail(format!("Failed to serialize result: {e}")));
    println!("{json}");
}

/// Sampled curves as CSV: `H0,posterior,prior` plus one column per individual likelihood.
pub fn render_curves(result: &AnalysisResult) -> String {
    let individual = result.individual_likelihoods.as_deref().unwrap_or(&[]);

    let mut out = String::from("H0,posterior,prior");
    for curve in individual {
        out.push(',');
        out.push_str(&curve.name);
    }
    out.push('\n');

    for (i, h0) in result.grid.values().iter().enumerate() {
        let _ = write!(out, "{h0},{},{}", result.posterior[i], result.prior_density[i]);
        for curve in individual {
            let _ = write!(out, ",{}", curve.values[i]);
        }
        out.push('\n');
    }
    out
}

pub fn write_curves(path: &Path, result: &AnalysisResult) {
    std::fs::write(path, render_curves(result))
        .unwrap_or_else(|e| bail(format!("Failed to write curves to {}: {e}", path.display())));
}

/// Print the event → counterparts catalog as a terminal table.
pub fn print_catalog(catalog: &[CatalogEntry]) {
    let event_width = catalog
        .iter()
        .map(|e| e.event.len())
        .max()
        .unwrap_or(5)
        .max(5); // at least "Event"

    println!("{:<event_width$} | Counterparts", "Event");
    println!("{}-|-------------", "-".repeat(event_width));
    for entry in catalog {
        let counterparts: Vec<&str> = entry
            .counterparts
            .iter()
            .map(|c| if c.is_empty() { "(none)" } else { c.as_str() })
            .collect();
        println!("{:<event_width$} | {}", entry.event, counterparts.join(", "));
    }

    let columns: usize = catalog.iter().map(|e| e.columns.len()).sum();
    println!("\n{} events, {} likelihood columns", catalog.len(), columns);
}
