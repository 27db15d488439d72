/// Name of the header that holds the H0 sample grid in a likelihood table.
pub const GRID_COLUMN: &str = "H0";

/// Separator between event and counterpart in a likelihood column header
/// (`GW170817_NGC4993`).
pub const EVENT_COUNTERPART_SEPARATOR: char = '_';

/// Default credible level for the highest-density interval.
pub const DEFAULT_CREDIBLE_LEVEL: f64 = 0.9;

/// Number of evenly spaced points the interpolating spline is evaluated on
/// when searching for the posterior mode.
///
/// Likelihood grids are typically sampled every 0.5-1 km/s/Mpc, far too coarse
/// to read the mode off directly. 100k points over a ~100 km/s/Mpc range puts
/// the MAP resolution around 1e-3 km/s/Mpc.
pub const MAP_RESAMPLE_POINTS: usize = 100_000;

/// Penalty scale for infeasible HDI candidates, as a multiple of the grid range.
/// Any legitimate interval is at most one grid range wide.
pub const INFEASIBLE_WIDTH_FACTOR: f64 = 1e4;

/// Floor used by `ZeroPolicy::Clamp` when no explicit floor is given.
/// ln(1e-300) ≈ -690.8, comfortably finite.
pub const DEFAULT_CLAMP_FLOOR: f64 = 1e-300;

/// Nelder-Mead defaults.
pub const NELDER_MEAD_XATOL: f64 = 1e-4;
pub const NELDER_MEAD_FATOL: f64 = 1e-4;
/// Iteration and evaluation budget per dimension.
pub const NELDER_MEAD_BUDGET_PER_DIM: usize = 200;
/// Relative perturbation used to build the initial simplex.
pub const NELDER_MEAD_NONZERO_DELTA: f64 = 0.05;
/// Absolute perturbation used for coordinates that start at zero.
pub const NELDER_MEAD_ZERO_DELTA: f64 = 0.00025;

/// Planck 2015 (TT,TE,EE+lowP+lensing+ext) H0 in km/s/Mpc.
pub const PLANCK_H0: f64 = 67.74;
pub const PLANCK_H0_SIGMA: f64 = 0.62;

/// SH0ES (Riess et al. 2016) H0 in km/s/Mpc.
pub const SHOES_H0: f64 = 73.24;
pub const SHOES_H0_SIGMA: f64 = 1.74;
