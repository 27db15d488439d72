/// Composite Simpson's rule over `(x, y)` samples.
///
/// Non-uniform grids are fine. Callers keep `x` strictly increasing and
/// `y.len() == x.len()`; `H0Grid` guarantees the former.
///
/// With an even number of intervals each pair of intervals is integrated with
/// the three-point irregular Simpson formula. With an odd number the last
/// interval gets a separate quadratic correction through the last three points,
/// so the result stays exact for quadratics. Two points fall back to the
/// trapezoid; fewer than two integrate to zero.
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    debug_assert_eq!(y.len(), x.len(), "simpson: y and x lengths differ");
    let n = y.len().min(x.len());

    match n {
        0 | 1 => return 0.0,
        2 => return 0.5 * (x[1] - x[0]) * (y[0] + y[1]),
        _ => {}
    }

    let intervals = n - 1;
    let paired_end = if intervals % 2 == 0 { n } else { n - 1 };

    let mut total = 0.0;
    let mut i = 0;
    while i + 2 < paired_end {
        total += simpson_pair(x[i], x[i + 1], x[i + 2], y[i], y[i + 1], y[i + 2]);
        i += 2;
    }

    if paired_end != n {
        // Last interval [x_{n-2}, x_{n-1}] from the parabola through the last three points.
        let h0 = x[n - 2] - x[n - 3];
        let h1 = x[n - 1] - x[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = (h1 * h1 * h1) / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    }

    total
}

/// Integral of the parabola through three points over `[x0, x2]`.
fn simpson_pair(x0: f64, x1: f64, x2: f64, y0: f64, y1: f64, y2: f64) -> f64 {
    let h0 = x1 - x0;
    let h1 = x2 - x1;
    let sum = h0 + h1;
    sum / 6.0 * ((2.0 - h1 / h0) * y0 + sum * sum / (h0 * h1) * y1 + (2.0 - h0 / h1) * y2)
}

/// Running trapezoid integral.
///
/// Element `i` is the integral from `x[0]` to `x[i + 1]`, so the output is one
/// shorter than the input (the zero at `x[0]` is not emitted).
pub fn cumulative_trapezoid(y: &[f64], x: &[f64]) -> Vec<f64> {
    debug_assert_eq!(y.len(), x.len(), "cumulative_trapezoid: y and x lengths differ");
    let n = y.len().min(x.len());
    let mut out = Vec::with_capacity(n.saturating_sub(1));
    let mut acc = 0.0;
    for i in 1..n {
        acc += 0.5 * (x[i] - x[i - 1]) * (y[i] + y[i - 1]);
        out.push(acc);
    }
    out
}
