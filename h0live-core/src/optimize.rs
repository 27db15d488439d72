/// Derivative-free local minimization (Nelder-Mead downhill simplex).
///
/// Standard coefficients: reflection 1, expansion 2, contraction 0.5, shrink 0.5.
/// Running out of budget is not an error: the best vertex found is returned
/// with `converged: false` and the caller decides what to do with it.
use crate::constants::{
    NELDER_MEAD_BUDGET_PER_DIM, NELDER_MEAD_FATOL, NELDER_MEAD_NONZERO_DELTA, NELDER_MEAD_XATOL,
    NELDER_MEAD_ZERO_DELTA,
};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    /// Converged once every vertex is within this distance (per coordinate) of the best one...
    pub xatol: f64,
    /// ...and every vertex value is within this of the best value.
    pub fatol: f64,
    /// `None` = 200 × dimension.
    pub max_iterations: Option<usize>,
    /// `None` = 200 × dimension.
    pub max_evaluations: Option<usize>,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        NelderMeadOptions {
            xatol: NELDER_MEAD_XATOL,
            fatol: NELDER_MEAD_FATOL,
            max_iterations: None,
            max_evaluations: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimize `f` starting from `x0`.
///
/// NaN objective values are treated as +inf so they always rank worst.
pub fn nelder_mead<F>(mut f: F, x0: &[f64], options: &NelderMeadOptions) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    assert!(n > 0, "nelder_mead needs at least one dimension");

    let budget = NELDER_MEAD_BUDGET_PER_DIM * n;
    let max_iterations = options.max_iterations.unwrap_or(budget);
    let max_evaluations = options.max_evaluations.unwrap_or(budget);

    let mut evaluations = 0usize;
    let mut eval = |x: &[f64], count: &mut usize| -> f64 {
        *count += 1;
        let v = f(x);
        if v.is_nan() { f64::INFINITY } else { v }
    };

    // Initial simplex: x0 plus one vertex per coordinate, nudged by 5%.
    let mut sim: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    sim.push(x0.to_vec());
    for k in 0..n {
        let mut y = x0.to_vec();
        if y[k] != 0.0 {
            y[k] *= 1.0 + NELDER_MEAD_NONZERO_DELTA;
        } else {
            y[k] = NELDER_MEAD_ZERO_DELTA;
        }
        sim.push(y);
    }
    let mut fsim: Vec<f64> = sim.iter().map(|v| eval(v, &mut evaluations)).collect();
    sort_simplex(&mut sim, &mut fsim);

    let mut iterations = 1usize;

    while evaluations < max_evaluations && iterations < max_iterations {
        let x_spread = sim[1..]
            .iter()
            .flat_map(|v| v.iter().zip(sim[0].iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        let f_spread = fsim[1..]
            .iter()
            .map(|v| (v - fsim[0]).abs())
            .fold(0.0_f64, f64::max);
        if x_spread <= options.xatol && f_spread <= options.fatol {
            break;
        }

        // Centroid of every vertex but the worst.
        let mut xbar = vec![0.0; n];
        for v in &sim[..n] {
            for (c, x) in xbar.iter_mut().zip(v.iter()) {
                *c += x / n as f64;
            }
        }
        let worst = sim[n].clone();
        let along = |coef: f64| -> Vec<f64> {
            xbar.iter()
                .zip(worst.iter())
                .map(|(c, w)| (1.0 + coef) * c - coef * w)
                .collect()
        };

        let xr = along(REFLECTION);
        let fxr = eval(&xr, &mut evaluations);
        let mut shrink = false;

        if fxr < fsim[0] {
            let xe = along(REFLECTION * EXPANSION);
            let fxe = eval(&xe, &mut evaluations);
            if fxe < fxr {
                sim[n] = xe;
                fsim[n] = fxe;
            } else {
                sim[n] = xr;
                fsim[n] = fxr;
            }
        } else if fxr < fsim[n - 1] {
            sim[n] = xr;
            fsim[n] = fxr;
        } else if fxr < fsim[n] {
            // Outside contraction.
            let xc = along(CONTRACTION * REFLECTION);
            let fxc = eval(&xc, &mut evaluations);
            if fxc <= fxr {
                sim[n] = xc;
                fsim[n] = fxc;
            } else {
                shrink = true;
            }
        } else {
            // Inside contraction.
            let xcc = along(-CONTRACTION);
            let fxcc = eval(&xcc, &mut evaluations);
            if fxcc < fsim[n] {
                sim[n] = xcc;
                fsim[n] = fxcc;
            } else {
                shrink = true;
            }
        }

        if shrink {
            let best = sim[0].clone();
            for j in 1..=n {
                for (x, b) in sim[j].iter_mut().zip(best.iter()) {
                    *x = b + SHRINK * (*x - b);
                }
                fsim[j] = eval(&sim[j], &mut evaluations);
            }
        }

        iterations += 1;
        sort_simplex(&mut sim, &mut fsim);
    }

    let converged = evaluations < max_evaluations && iterations < max_iterations;

    NelderMeadResult {
        x: sim.swap_remove(0),
        fx: fsim[0],
        iterations,
        evaluations,
        converged,
    }
}

/// Reorder vertices by objective value, best first. Stable for ties.
fn sort_simplex(sim: &mut Vec<Vec<f64>>, fsim: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..fsim.len()).collect();
    order.sort_by(|&a, &b| fsim[a].total_cmp(&fsim[b]));
    *sim = order.iter().map(|&i| sim[i].clone()).collect();
    *fsim = order.iter().map(|&i| fsim[i]).collect();
}
