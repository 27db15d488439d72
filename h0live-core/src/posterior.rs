/// Posterior combiner.
///
/// Selected likelihood columns are multiplied in log space, weighted by the
/// prior and normalized with Simpson's rule on the H0 grid. Pure functions of
/// their inputs.
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_CLAMP_FLOOR;
use crate::error::{H0Error, Result};
use crate::integrate::simpson;
use crate::table::LikelihoodTable;
use crate::types::{Curve, H0Grid};

/// Prior on H0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Prior {
    /// Flat in H0.
    #[default]
    Uniform,
    /// Flat in ln(H0), i.e. density ∝ 1/H0.
    Log,
}

impl Prior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prior::Uniform => "uniform",
            Prior::Log => "log",
        }
    }

    /// Closed-form prior density on the grid, normalized over `[first, last]`.
    pub fn density(&self, grid: &H0Grid) -> Result<Vec<f64>> {
        match self {
            Prior::Uniform => Ok(vec![1.0 / grid.range(); grid.len()]),
            Prior::Log => {
                require_positive_grid(grid)?;
                let log_range = grid.last().ln() - grid.first().ln();
                Ok(grid.values().iter().map(|h| 1.0 / (h * log_range)).collect())
            }
        }
    }

    /// ln of the (unnormalized) prior weight at `h0`.
    fn log_weight(&self, h0: f64) -> f64 {
        match self {
            Prior::Uniform => 0.0,
            Prior::Log => -h0.ln(),
        }
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prior {
    type Err = H0Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Prior::Uniform),
            "log" => Ok(Prior::Log),
            _ => Err(H0Error::InvalidPrior { value: s.to_string() }),
        }
    }
}

fn require_positive_grid(grid: &H0Grid) -> Result<()> {
    if grid.first() <= 0.0 {
        return Err(H0Error::invalid_grid(format!(
            "log prior needs H0 > 0, grid starts at {}",
            grid.first()
        )));
    }
    Ok(())
}

/// What to do with likelihood values whose logarithm is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ZeroPolicy {
    /// Fail with `NonPositiveLikelihood` on the first zero, negative or
    /// non-finite value.
    #[default]
    Reject,
    /// Raise values below `floor` to `floor`. NaN and infinities are still rejected.
    Clamp { floor: f64 },
}

impl ZeroPolicy {
    /// `Clamp` with the default floor.
    pub fn clamp() -> Self {
        ZeroPolicy::Clamp { floor: DEFAULT_CLAMP_FLOOR }
    }

    fn log_value(&self, event: &str, index: usize, h0: f64, value: f64) -> Result<f64> {
        let reject = || H0Error::NonPositiveLikelihood {
            event: event.to_string(),
            index,
            h0,
            value,
        };
        if !value.is_finite() {
            return Err(reject());
        }
        match *self {
            ZeroPolicy::Reject if value <= 0.0 => Err(reject()),
            ZeroPolicy::Reject => Ok(value.ln()),
            ZeroPolicy::Clamp { floor } => Ok(value.max(floor).ln()),
        }
    }
}

/// Product of the selected likelihoods, held as a sum of logs.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedLikelihood {
    events: Vec<String>,
    log_values: Vec<f64>,
}

impl CombinedLikelihood {
    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn log_values(&self) -> &[f64] {
        &self.log_values
    }

    /// The product itself. May underflow to zero for many sharp events; the
    /// posterior never goes through this.
    pub fn values(&self) -> Vec<f64> {
        self.log_values.iter().map(|l| l.exp()).collect()
    }
}

/// Multiply the selected likelihood columns (sum of logs).
///
/// Every id must be an exact column id. All columns are looked up before any
/// arithmetic, so an unknown id fails without doing partial work.
pub fn combine_likelihoods<S: AsRef<str>>(
    table: &LikelihoodTable,
    selection: &[S],
    policy: ZeroPolicy,
) -> Result<CombinedLikelihood> {
    if selection.is_empty() {
        return Err(H0Error::EmptySelection);
    }

    let columns = selection
        .iter()
        .map(|id| table.column(id.as_ref()).map(|c| (id.as_ref(), c)))
        .collect::<Result<Vec<_>>>()?;

    let grid = table.grid().values();
    let mut log_values = vec![0.0; grid.len()];
    for (id, column) in &columns {
        for (i, (&value, acc)) in column.iter().zip(log_values.iter_mut()).enumerate() {
            *acc += policy.log_value(id, i, grid[i], value)?;
        }
    }

    Ok(CombinedLikelihood {
        events: columns.iter().map(|(id, _)| id.to_string()).collect(),
        log_values,
    })
}

/// Divide `y` by its Simpson integral over the grid.
pub fn normalize(y: &[f64], grid: &H0Grid) -> Result<Vec<f64>> {
    grid.check_aligned("curve", y.len())?;
    let norm = simpson(y, grid.values());
    if !norm.is_finite() || norm <= 0.0 {
        return Err(H0Error::degenerate(format!(
            "curve integrates to {norm}, cannot normalize"
        )));
    }
    Ok(y.iter().map(|v| v / norm).collect())
}

/// Normalized posterior and the prior it was built with.
#[derive(Debug, Clone)]
pub struct Posterior {
    pub events: Vec<String>,
    pub prior: Prior,
    /// Integrates to 1 under Simpson's rule on the grid.
    pub density: Vec<f64>,
    pub prior_density: Vec<f64>,
}

/// Combine the selection, apply the prior and normalize.
///
/// The log posterior is shifted by its maximum before exponentiating; the
/// shift cancels in the normalization and keeps products of many events from
/// underflowing.
pub fn build_posterior<S: AsRef<str>>(
    table: &LikelihoodTable,
    selection: &[S],
    prior: Prior,
    policy: ZeroPolicy,
) -> Result<Posterior> {
    let grid = table.grid();
    if prior == Prior::Log {
        require_positive_grid(grid)?;
    }

    let combined = combine_likelihoods(table, selection, policy)?;

    let log_post: Vec<f64> = combined
        .log_values()
        .iter()
        .zip(grid.values())
        .map(|(l, &h0)| l + prior.log_weight(h0))
        .collect();
    let peak = log_post.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let unnormalized: Vec<f64> = log_post.iter().map(|l| (l - peak).exp()).collect();

    let density = normalize(&unnormalized, grid)?;
    let prior_density = prior.density(grid)?;

    tracing::debug!(
        events = ?combined.events(),
        prior = %prior,
        log_peak = peak,
        "built posterior"
    );

    Ok(Posterior {
        events: combined.events,
        prior,
        density,
        prior_density,
    })
}

/// Each selected likelihood normalized on its own, for overlaying on the combined posterior.
pub fn normalized_likelihoods<S: AsRef<str>>(
    table: &LikelihoodTable,
    selection: &[S],
) -> Result<Vec<Curve>> {
    selection
        .iter()
        .map(|id| {
            let id = id.as_ref();
            let values = normalize(table.column(id)?, table.grid())?;
            Ok(Curve { name: id.to_string(), values })
        })
        .collect()
}
