/// Unified analysis entry point.
///
/// One function, one options struct. Pure function: no IO, no state.
/// Resolves the selection, builds the posterior, finds the HDI and MAP, and
/// collects whatever overlays the caller asked for.
use std::collections::HashSet;

use crate::error::{H0Error, Result};
use crate::interval::credible_interval;
use crate::posterior::{build_posterior, normalized_likelihoods};
use crate::table::LikelihoodTable;
use crate::types::{AnalysisOptions, AnalysisResult, ReferenceBand};

/// Run the full posterior analysis on a likelihood table.
///
/// `options.events` may hold exact column ids or bare event names (resolved to
/// the event's first counterpart). Repeated selections are combined once.
/// Any unknown id fails the whole call; no partial result is returned.
pub fn run_analysis(table: &LikelihoodTable, options: &AnalysisOptions) -> Result<AnalysisResult> {
    if options.events.is_empty() {
        return Err(H0Error::EmptySelection);
    }
    if !(options.level > 0.0 && options.level < 1.0) {
        return Err(H0Error::InvalidLevel { level: options.level });
    }

    let mut seen = HashSet::new();
    let mut events = Vec::with_capacity(options.events.len());
    for selector in &options.events {
        let id = table.resolve(selector)?;
        if seen.insert(id.clone()) {
            events.push(id);
        } else {
            tracing::debug!(event = %id, "ignoring repeated selection");
        }
    }

    let posterior = build_posterior(table, events.as_slice(), options.prior, options.zero_policy)?;
    let (interval, diagnostics) =
        credible_interval(&posterior.density, table.grid(), options.level)?;

    let individual_likelihoods = if options.individual_likelihoods {
        Some(normalized_likelihoods(table, events.as_slice())?)
    } else {
        None
    };

    let mut reference_bands = Vec::new();
    if options.planck {
        reference_bands.push(ReferenceBand::PLANCK);
    }
    if options.shoes {
        reference_bands.push(ReferenceBand::SHOES);
    }

    tracing::info!(
        events = ?events,
        prior = %options.prior,
        level = options.level,
        map = interval.map,
        lower = interval.lower,
        upper = interval.upper,
        "analysis complete"
    );

    Ok(AnalysisResult {
        grid: table.grid().clone(),
        events,
        prior: options.prior,
        level: options.level,
        posterior: posterior.density,
        prior_density: posterior.prior_density,
        interval,
        diagnostics,
        individual_likelihoods,
        reference_bands,
    })
}
