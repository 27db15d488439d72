/// h0live-core: Pure-computation H0 posterior engine.
///
/// Per-event likelihood columns → combined posterior under a prior → highest-density
/// credible interval and MAP. No IO, no plotting, no filesystem.
///
/// Likelihood columns are identified by their table headers (`<Event>_<Counterpart>`).
/// The crate handles the mapping to column indices; callers never see them.
///
/// # Quick start
///
/// ```rust
/// use h0live_core::{run_analysis, AnalysisOptions, LikelihoodTable};
///
/// let csv = "\
/// H0,GW170817_NGC4993,GW190814_Host
/// 60,0.20,0.40
/// 65,0.70,0.60
/// 70,1.00,0.90
/// 75,0.60,0.80
/// 80,0.15,0.50
/// ";
/// let table = LikelihoodTable::from_csv_str(csv).unwrap();
///
/// let result = run_analysis(&table, &AnalysisOptions {
///     events: vec!["GW170817_NGC4993".into(), "GW190814".into()],
///     level: 0.68,
///     ..AnalysisOptions::default()
/// }).unwrap();
///
/// let (plus, minus) = result.interval.error_bars();
/// println!("H0 = {:.1} +{:.1} -{:.1}", result.interval.map, plus, minus);
/// ```

pub mod analysis;
pub mod constants;
pub mod error;
pub mod integrate;
pub mod interp;
pub mod interval;
pub mod optimize;
pub mod posterior;
pub mod table;
pub mod types;

// Re-export primary public API at crate root.
pub use analysis::run_analysis;
pub use error::{H0Error, Result, TableError};
pub use interval::{credible_interval, highest_density_interval, map_estimate, Hdi};
pub use posterior::{
    build_posterior, combine_likelihoods, normalize, normalized_likelihoods, CombinedLikelihood,
    Posterior, Prior, ZeroPolicy,
};
pub use table::LikelihoodTable;
pub use types::{
    AnalysisOptions, AnalysisResult, CatalogEntry, CredibleInterval, Curve, EventKey, H0Grid,
    HdiDiagnostics, ReferenceBand,
};
