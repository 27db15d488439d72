use crate::constants::{
    DEFAULT_CREDIBLE_LEVEL, EVENT_COUNTERPART_SEPARATOR, PLANCK_H0, PLANCK_H0_SIGMA, SHOES_H0,
    SHOES_H0_SIGMA,
};
use crate::error::{H0Error, Result};
use crate::posterior::{Prior, ZeroPolicy};

/// Ordered H0 sample points shared by every likelihood column.
///
/// Guaranteed to hold at least two finite, strictly increasing values.
/// Spacing need not be uniform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct H0Grid {
    values: Vec<f64>,
}

impl H0Grid {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(H0Error::invalid_grid(format!(
                "need at least 2 points, got {}",
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(H0Error::invalid_grid(format!(
                "non-finite value {} at index {}",
                values[i], i
            )));
        }
        if let Some(i) = values.windows(2).position(|w| w[1] <= w[0]) {
            return Err(H0Error::invalid_grid(format!(
                "not strictly increasing at index {} ({} then {})",
                i + 1,
                values[i],
                values[i + 1]
            )));
        }
        Ok(H0Grid { values })
    }

    /// Evenly spaced grid from `start` to `end` inclusive.
    pub fn uniform(start: f64, end: f64, points: usize) -> Result<Self> {
        H0Grid::new(crate::interp::linspace(start, end, points))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Width of the grid domain, `last - first`.
    pub fn range(&self) -> f64 {
        self.last() - self.first()
    }

    /// Fail with `LengthMismatch` unless `len` matches the grid length.
    pub fn check_aligned(&self, name: &str, len: usize) -> Result<()> {
        if len != self.values.len() {
            return Err(H0Error::LengthMismatch {
                name: name.to_string(),
                expected: self.values.len(),
                got: len,
            });
        }
        Ok(())
    }
}

/// Likelihood column identifier, `<Event>_<Counterpart>`.
///
/// Split at the first separator, so counterpart names may themselves contain
/// underscores. A header without a separator is an event with no named
/// counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventKey {
    pub id: String,
    pub event: String,
    pub counterpart: Option<String>,
}

impl EventKey {
    pub fn parse(id: &str) -> Self {
        match id.split_once(EVENT_COUNTERPART_SEPARATOR) {
            Some((event, counterpart)) => EventKey {
                id: id.to_string(),
                event: event.to_string(),
                counterpart: Some(counterpart.to_string()),
            },
            None => EventKey {
                id: id.to_string(),
                event: id.to_string(),
                counterpart: None,
            },
        }
    }
}

/// One event and the counterparts it has likelihood columns for, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogEntry {
    pub event: String,
    /// Column ids (`<Event>_<Counterpart>`), first one is the default.
    pub columns: Vec<String>,
    pub counterparts: Vec<String>,
}

/// Highest-density interval and posterior mode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredibleInterval {
    pub lower: f64,
    pub upper: f64,
    /// Maximum a posteriori H0.
    pub map: f64,
}

impl CredibleInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains_map(&self) -> bool {
        self.lower <= self.map && self.map <= self.upper
    }

    /// Asymmetric error bars around the MAP: `(upper - map, map - lower)`.
    pub fn error_bars(&self) -> (f64, f64) {
        (self.upper - self.map, self.map - self.lower)
    }
}

/// How the HDI search went. Non-convergence is not an error; it is reported here.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HdiDiagnostics {
    /// Probability mass below the interval's lower bound.
    pub lower_tail_probability: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// External H0 measurement drawn as a `center ± spread` band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReferenceBand {
    pub name: &'static str,
    pub center: f64,
    pub spread: f64,
}

impl ReferenceBand {
    pub const PLANCK: ReferenceBand = ReferenceBand {
        name: "Planck",
        center: PLANCK_H0,
        spread: PLANCK_H0_SIGMA,
    };

    pub const SHOES: ReferenceBand = ReferenceBand {
        name: "SH0ES",
        center: SHOES_H0,
        spread: SHOES_H0_SIGMA,
    };

    pub fn lower(&self) -> f64 {
        self.center - self.spread
    }

    pub fn upper(&self) -> f64 {
        self.center + self.spread
    }
}

/// Options for `run_analysis()`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisOptions {
    /// Column ids to combine, or bare event names (first counterpart is used).
    /// Must be non-empty; use `LikelihoodTable::default_selection()` when the
    /// user picked nothing.
    pub events: Vec<String>,
    pub prior: Prior,
    /// Credible level for the HDI, strictly inside (0, 1).
    pub level: f64,
    pub zero_policy: ZeroPolicy,
    /// Include the Planck reference band in the result.
    pub planck: bool,
    /// Include the SH0ES reference band in the result.
    pub shoes: bool,
    /// Also return each selected event's likelihood, normalized on its own.
    pub individual_likelihoods: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            events: Vec::new(),
            prior: Prior::Uniform,
            level: DEFAULT_CREDIBLE_LEVEL,
            zero_policy: ZeroPolicy::Reject,
            planck: false,
            shoes: false,
            individual_likelihoods: false,
        }
    }
}

/// A named curve sampled on the H0 grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Curve {
    pub name: String,
    pub values: Vec<f64>,
}

/// Result from `run_analysis()`. Everything a renderer needs, nothing it has
/// to recompute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnalysisResult {
    pub grid: H0Grid,
    /// Resolved column ids, in selection order.
    pub events: Vec<String>,
    pub prior: Prior,
    pub level: f64,
    /// Normalized posterior, aligned with `grid`.
    pub posterior: Vec<f64>,
    /// Closed-form prior density, aligned with `grid`.
    pub prior_density: Vec<f64>,
    pub interval: CredibleInterval,
    pub diagnostics: HdiDiagnostics,
    /// Per-event normalized likelihoods. `None` unless requested.
    pub individual_likelihoods: Option<Vec<Curve>>,
    pub reference_bands: Vec<ReferenceBand>,
}
