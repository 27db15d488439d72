/// Credible interval estimator: highest-density interval and MAP.
///
/// The HDI is found by inverting the trapezoid CDF and minimizing the width of
/// `[ppf(p), ppf(p + level)]` over the lower-tail probability `p` with
/// Nelder-Mead. This assumes a unimodal posterior: for multimodal curves the
/// result is the shortest single interval near the starting point, not a
/// union of intervals.
///
/// The CDF starts at the second grid point, so the mass between the first two
/// grid points can never fall inside the interval. A posterior peaked at the
/// lower grid edge gets an HDI that excludes its MAP (logged at `warn`), or a
/// `DegeneratePosterior` error when the remaining mass is below the level.
use crate::constants::{INFEASIBLE_WIDTH_FACTOR, MAP_RESAMPLE_POINTS};
use crate::error::{H0Error, Result};
use crate::integrate::cumulative_trapezoid;
use crate::interp::{linspace, CubicSpline, LinearInterpolator};
use crate::optimize::{nelder_mead, NelderMeadOptions};
use crate::types::{CredibleInterval, H0Grid, HdiDiagnostics};

/// Bounds of a highest-density interval plus how the search went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hdi {
    pub lower: f64,
    pub upper: f64,
    pub diagnostics: HdiDiagnostics,
}

fn check_level(level: f64) -> Result<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(H0Error::InvalidLevel { level });
    }
    Ok(())
}

/// HDI and MAP of a normalized posterior sampled on `grid`.
///
/// Optimizer non-convergence is logged and reported in the diagnostics, not
/// raised. A MAP outside the interval is logged as well.
pub fn credible_interval(
    posterior: &[f64],
    grid: &H0Grid,
    level: f64,
) -> Result<(CredibleInterval, HdiDiagnostics)> {
    let hdi = highest_density_interval(posterior, grid, level)?;
    let map = map_estimate(posterior, grid)?;

    let interval = CredibleInterval {
        lower: hdi.lower,
        upper: hdi.upper,
        map,
    };
    if !interval.contains_map() {
        tracing::warn!(
            lower = interval.lower,
            upper = interval.upper,
            map,
            "MAP lies outside the HDI; the posterior is probably multimodal"
        );
    }
    Ok((interval, hdi.diagnostics))
}

/// Shortest interval holding `level` of the posterior mass.
pub fn highest_density_interval(posterior: &[f64], grid: &H0Grid, level: f64) -> Result<Hdi> {
    highest_density_interval_with(posterior, grid, level, &NelderMeadOptions::default())
}

pub(crate) fn highest_density_interval_with(
    posterior: &[f64],
    grid: &H0Grid,
    level: f64,
    options: &NelderMeadOptions,
) -> Result<Hdi> {
    check_level(level)?;
    grid.check_aligned("posterior", posterior.len())?;

    let ppf = inverse_cdf(posterior, grid)?;
    let (cdf_lo, cdf_hi) = ppf.domain();
    if cdf_hi - cdf_lo < level {
        return Err(H0Error::degenerate(format!(
            "only {:.6} of the posterior mass is invertible, cannot hold level {level}",
            cdf_hi - cdf_lo
        )));
    }

    let penalty = INFEASIBLE_WIDTH_FACTOR * grid.range();
    let width = |p: &[f64]| -> f64 {
        let p = p[0];
        match (ppf.eval(p), ppf.eval(p + level)) {
            (Some(lo), Some(hi)) if hi > lo => hi - lo,
            _ => {
                // Grows with the distance outside the invertible range so the
                // simplex has a slope to follow back.
                let overshoot = (cdf_lo - p).max(0.0) + (p + level - cdf_hi).max(0.0);
                penalty * (1.0 + overshoot)
            }
        }
    };

    let result = nelder_mead(width, &[1.0 - level], options);
    if !result.converged {
        tracing::warn!(
            iterations = result.iterations,
            evaluations = result.evaluations,
            level,
            "HDI search did not converge, using best interval found"
        );
    }

    let p = result.x[0].min(cdf_hi - level).max(cdf_lo);
    let invert = |q: f64| {
        ppf.eval(q.clamp(cdf_lo, cdf_hi))
            .ok_or_else(|| H0Error::degenerate(format!("cannot invert CDF at {q}")))
    };
    let lower = invert(p)?;
    let upper = invert(p + level)?;

    tracing::debug!(lower, upper, lower_tail = p, iterations = result.iterations, "HDI");

    Ok(Hdi {
        lower,
        upper,
        diagnostics: HdiDiagnostics {
            lower_tail_probability: p,
            iterations: result.iterations,
            evaluations: result.evaluations,
            converged: result.converged,
        },
    })
}

/// Piecewise-linear inverse of the trapezoid CDF.
///
/// The CDF starts at the second grid point. Only strictly positive values are
/// kept, and of any run of equal values only the first, so the inverse is a
/// function.
fn inverse_cdf(posterior: &[f64], grid: &H0Grid) -> Result<LinearInterpolator> {
    let cdf = cumulative_trapezoid(posterior, grid.values());

    let mut probs: Vec<f64> = Vec::with_capacity(cdf.len());
    let mut h0s: Vec<f64> = Vec::with_capacity(cdf.len());
    for (&c, &h0) in cdf.iter().zip(&grid.values()[1..]) {
        if !c.is_finite() {
            return Err(H0Error::degenerate(format!("non-finite CDF value at H0 = {h0}")));
        }
        if c > 0.0 && probs.last().map_or(true, |&last| c > last) {
            probs.push(c);
            h0s.push(h0);
        }
    }

    if probs.len() < 2 {
        return Err(H0Error::degenerate(format!(
            "{} strictly positive CDF point(s), need at least 2",
            probs.len()
        )));
    }

    LinearInterpolator::new(probs, h0s)
        .ok_or_else(|| H0Error::degenerate("CDF is not invertible"))
}

/// Posterior mode from an interpolating spline resampled on a dense grid.
///
/// The first maximum wins on ties.
pub fn map_estimate(posterior: &[f64], grid: &H0Grid) -> Result<f64> {
    map_estimate_with_resolution(posterior, grid, MAP_RESAMPLE_POINTS)
}

pub(crate) fn map_estimate_with_resolution(
    posterior: &[f64],
    grid: &H0Grid,
    points: usize,
) -> Result<f64> {
    grid.check_aligned("posterior", posterior.len())?;
    let spline = CubicSpline::new(grid.values().to_vec(), posterior.to_vec())
        .ok_or_else(|| H0Error::degenerate("posterior has non-finite values"))?;

    let mut best_h0 = grid.first();
    let mut best = f64::NEG_INFINITY;
    for h0 in linspace(grid.first(), grid.last(), points) {
        let v = spline.eval(h0);
        if v > best {
            best = v;
            best_h0 = h0;
        }
    }
    Ok(best_h0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::{build_posterior, normalize, Prior, ZeroPolicy};
    use crate::table::LikelihoodTable;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn gaussian(grid: &H0Grid, mu: f64, sigma: f64) -> Vec<f64> {
        grid.values()
            .iter()
            .map(|h| (-(h - mu) * (h - mu) / (2.0 * sigma * sigma)).exp())
            .collect()
    }

    fn triangle_grid() -> (H0Grid, Vec<f64>) {
        let grid = H0Grid::uniform(60.0, 80.0, 21).unwrap();
        let tri = grid.values().iter().map(|h| 11.0 - (h - 70.0).abs()).collect();
        (grid, tri)
    }

    #[test]
    fn test_triangular_peak_scenario() {
        let (grid, tri) = triangle_grid();
        let post = normalize(&tri, &grid).unwrap();
        let (ci, diag) = credible_interval(&post, &grid, 0.5).unwrap();

        assert!((ci.map - 70.0).abs() < 0.01, "MAP = {}", ci.map);
        assert!(diag.converged);
        assert!(ci.width() > 0.0 && ci.width() < grid.range());
        assert!(((ci.lower + ci.upper) / 2.0 - 70.0).abs() < 0.25, "{ci:?}");
        // Analytic half-width: 11 - sqrt(61).
        let half = 11.0 - 61.0_f64.sqrt();
        assert!((ci.width() - 2.0 * half).abs() < 0.1, "width = {}", ci.width());
        assert!(ci.contains_map());
    }

    #[test]
    fn test_gaussian_round_trip() {
        let (mu, sigma) = (70.3, 4.0);
        let grid = H0Grid::uniform(40.0, 100.0, 241).unwrap();
        let spacing = 0.25;
        let post = normalize(&gaussian(&grid, mu, sigma), &grid).unwrap();

        let (ci, _) = credible_interval(&post, &grid, 0.6827).unwrap();
        assert!((ci.map - mu).abs() <= spacing, "MAP = {}", ci.map);

        // ±1σ within 5% of σ.
        let tol = 0.05 * sigma;
        assert!((ci.lower - (mu - sigma)).abs() < tol, "lower = {}", ci.lower);
        assert!((ci.upper - (mu + sigma)).abs() < tol, "upper = {}", ci.upper);
    }

    #[test]
    fn test_width_grows_with_level() {
        let grid = H0Grid::uniform(40.0, 100.0, 241).unwrap();
        let post = normalize(&gaussian(&grid, 68.0, 5.0), &grid).unwrap();
        let widths: Vec<f64> = [0.3, 0.5, 0.6827, 0.9, 0.95]
            .iter()
            .map(|&level| {
                let hdi = highest_density_interval(&post, &grid, level).unwrap();
                hdi.upper - hdi.lower
            })
            .collect();
        assert!(widths.windows(2).all(|w| w[1] >= w[0]), "{widths:?}");
    }

    #[test]
    fn test_hdi_is_shorter_than_equal_tailed_for_skewed_posterior() {
        // Right-skewed (log-normal shaped) posterior.
        let grid = H0Grid::uniform(30.0, 200.0, 681).unwrap();
        let y: Vec<f64> = grid
            .values()
            .iter()
            .map(|h| {
                let z = (h.ln() - 70.0_f64.ln()) / 0.25;
                (-0.5 * z * z).exp() / h
            })
            .collect();
        let post = normalize(&y, &grid).unwrap();
        let hdi = highest_density_interval(&post, &grid, 0.9).unwrap();

        let cdf = cumulative_trapezoid(&post, grid.values());
        let ppf = LinearInterpolator::new(cdf, grid.values()[1..].to_vec()).unwrap();
        let equal_tailed = ppf.eval(0.95).unwrap() - ppf.eval(0.05).unwrap();
        assert!(hdi.upper - hdi.lower < equal_tailed);
    }

    #[test]
    fn test_combining_events_narrows_interval() {
        let (grid, tri) = triangle_grid();
        let table = LikelihoodTable::new(
            grid.clone(),
            vec![("A_x".to_string(), tri.clone()), ("B_y".to_string(), tri)],
        )
        .unwrap();

        let single =
            build_posterior(&table, &["A_x"], Prior::Uniform, ZeroPolicy::Reject).unwrap();
        let both =
            build_posterior(&table, &["A_x", "B_y"], Prior::Uniform, ZeroPolicy::Reject).unwrap();

        let w_single = highest_density_interval(&single.density, &grid, 0.5).unwrap();
        let w_both = highest_density_interval(&both.density, &grid, 0.5).unwrap();
        assert!(
            w_both.upper - w_both.lower < w_single.upper - w_single.lower,
            "{w_both:?} vs {w_single:?}"
        );
    }

    #[test]
    fn test_map_inside_interval_for_random_unimodal_posteriors() {
        let mut rng = SmallRng::seed_from_u64(17);
        let grid = H0Grid::uniform(20.0, 140.0, 241).unwrap();
        for _ in 0..20 {
            let mu = rng.random_range(55.0..85.0);
            let sigma = rng.random_range(2.0..8.0);
            let level = rng.random_range(0.3..0.95);
            let post = normalize(&gaussian(&grid, mu, sigma), &grid).unwrap();
            let (ci, _) = credible_interval(&post, &grid, level).unwrap();
            assert!(ci.contains_map(), "mu={mu} sigma={sigma} level={level}: {ci:?}");
        }
    }

    #[test]
    fn test_zero_posterior_is_degenerate() {
        let grid = H0Grid::uniform(60.0, 80.0, 21).unwrap();
        assert!(matches!(
            highest_density_interval(&[0.0; 21], &grid, 0.9),
            Err(H0Error::DegeneratePosterior { .. })
        ));
    }

    #[test]
    fn test_invalid_levels() {
        let (grid, tri) = triangle_grid();
        let post = normalize(&tri, &grid).unwrap();
        for level in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                highest_density_interval(&post, &grid, level),
                Err(H0Error::InvalidLevel { .. })
            ));
        }
    }

    #[test]
    fn test_misaligned_posterior() {
        let (grid, _) = triangle_grid();
        assert!(matches!(
            credible_interval(&[1.0; 5], &grid, 0.9),
            Err(H0Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_non_convergence_still_returns_an_interval() {
        let grid = H0Grid::uniform(40.0, 100.0, 241).unwrap();
        let post = normalize(&gaussian(&grid, 70.0, 4.0), &grid).unwrap();
        let opts = NelderMeadOptions {
            max_iterations: Some(2),
            ..NelderMeadOptions::default()
        };
        let hdi = highest_density_interval_with(&post, &grid, 0.9, &opts).unwrap();
        assert!(!hdi.diagnostics.converged);
        assert!(hdi.lower < hdi.upper);
        assert!(hdi.lower >= grid.first() && hdi.upper <= grid.last());
    }

    #[test]
    fn test_bimodal_posterior_completes() {
        // Known limitation: a single interval is returned for multimodal curves.
        let grid = H0Grid::uniform(40.0, 100.0, 241).unwrap();
        let y: Vec<f64> = gaussian(&grid, 55.0, 2.0)
            .iter()
            .zip(gaussian(&grid, 85.0, 2.0))
            .map(|(a, b)| a + 0.8 * b)
            .collect();
        let post = normalize(&y, &grid).unwrap();
        let (ci, _) = credible_interval(&post, &grid, 0.6).unwrap();
        assert!(ci.lower < ci.upper);
        assert!((ci.map - 55.0).abs() < 0.5);
    }

    #[test]
    fn test_posterior_peaked_at_lower_edge() {
        // Half-Gaussian with its mode on the first grid point.
        let grid = H0Grid::uniform(60.0, 80.0, 21).unwrap();
        let post = normalize(&gaussian(&grid, 60.0, 3.0), &grid).unwrap();

        let (ci, _) = credible_interval(&post, &grid, 0.5).unwrap();
        assert!(ci.map < 60.5, "MAP = {}", ci.map);
        assert!(ci.lower >= 61.0 - 1e-9, "{ci:?}");
        assert!(!ci.contains_map());

        assert!(matches!(
            credible_interval(&post, &grid, 0.9),
            Err(H0Error::DegeneratePosterior { .. })
        ));
    }

    #[test]
    fn test_map_resolves_between_grid_points() {
        // Coarse 2-unit grid, true mode at 71.3.
        let grid = H0Grid::uniform(50.0, 90.0, 21).unwrap();
        let post = normalize(&gaussian(&grid, 71.3, 5.0), &grid).unwrap();
        let map = map_estimate(&post, &grid).unwrap();
        assert!((map - 71.3).abs() < 0.2, "MAP = {map}");

        let coarse = map_estimate_with_resolution(&post, &grid, 21).unwrap();
        assert_eq!(coarse, 72.0);
    }
}
