/// `n` evenly spaced points from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

fn strictly_increasing(xs: &[f64]) -> bool {
    xs.iter().all(|v| v.is_finite()) && xs.windows(2).all(|w| w[1] > w[0])
}

/// Index `i` of the segment `[xs[i], xs[i + 1]]` used for `x`, clamped to the
/// end segments for points outside the knots.
fn segment_index(xs: &[f64], x: f64) -> usize {
    let upper = xs.partition_point(|&k| k <= x);
    upper.saturating_sub(1).min(xs.len() - 2)
}

/// Piecewise-linear interpolation that does not extrapolate.
///
/// Inverts the CDF for the HDI search.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolator {
    /// `None` unless there are at least two knots, `xs` is strictly increasing
    /// and both slices have the same length.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        if xs.len() < 2 || xs.len() != ys.len() || !strictly_increasing(&xs) {
            return None;
        }
        Some(LinearInterpolator { xs, ys })
    }

    /// Closed interval covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Interpolated value, or `None` outside the knot range (and for NaN).
    pub fn eval(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !(lo..=hi).contains(&x) {
            return None;
        }
        let i = segment_index(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        Some(self.ys[i] + t * (self.ys[i + 1] - self.ys[i]))
    }
}

/// Interpolating cubic spline with not-a-knot end conditions.
///
/// Passes exactly through every knot, reproduces cubic polynomials exactly and
/// extrapolates with the end pieces. Three knots give the interpolating
/// parabola, two give a straight line. Resamples the posterior for the MAP.
///
/// Construction returns `None` for bad knots or non-finite values, leaving the
/// caller to pick the error that fits its context.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot.
    second_derivs: Vec<f64>,
}

impl CubicSpline {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        if xs.len() < 2 || xs.len() != ys.len() || !strictly_increasing(&xs) {
            return None;
        }
        if ys.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let second_derivs = not_a_knot_second_derivatives(&xs, &ys);
        Some(CubicSpline { xs, ys, second_derivs })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let i = segment_index(&self.xs, x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.second_derivs[i], self.second_derivs[i + 1]);
        let h = x1 - x0;
        let a = x1 - x;
        let b = x - x0;
        m0 * a * a * a / (6.0 * h)
            + m1 * b * b * b / (6.0 * h)
            + (y0 - m0 * h * h / 6.0) * a / h
            + (y1 - m1 * h * h / 6.0) * b / h
    }
}

/// Knot second derivatives `M` for the not-a-knot spline.
///
/// The not-a-knot conditions (third derivative continuous across the second
/// and the second-to-last knot) eliminate `M[0]` and `M[n-1]`, leaving a
/// tridiagonal system for the interior values.
fn not_a_knot_second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

    match n {
        2 => return vec![0.0; 2],
        3 => {
            let m = 6.0 * (slope[1] - slope[0]) / (3.0 * (h[0] + h[1]));
            return vec![m; 3];
        }
        _ => {}
    }

    // Row r solves for M[r + 1].
    let k = n - 2;
    let mut sub = vec![0.0; k];
    let mut diag = vec![0.0; k];
    let mut sup = vec![0.0; k];
    let mut rhs = vec![0.0; k];

    for r in 0..k {
        let i = r + 1;
        sub[r] = h[i - 1];
        diag[r] = 2.0 * (h[i - 1] + h[i]);
        sup[r] = h[i];
        rhs[r] = 6.0 * (slope[i] - slope[i - 1]);
    }

    let (h0, h1) = (h[0], h[1]);
    diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
    sup[0] = (h1 * h1 - h0 * h0) / h1;

    let (ha, hb) = (h[n - 3], h[n - 2]);
    sub[k - 1] = (ha * ha - hb * hb) / ha;
    diag[k - 1] = (ha + hb) * (2.0 * ha + hb) / ha;
    sup[k - 1] = 0.0;

    let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs);

    let mut m = vec![0.0; n];
    m[1..n - 1].copy_from_slice(&interior);
    m[0] = m[1] + h0 / h1 * (m[1] - m[2]);
    m[n - 1] = m[n - 2] + hb / ha * (m[n - 2] - m[n - 3]);
    m
}

/// Thomas algorithm. `sub[0]` and `sup[last]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let k = diag.len();
    let mut c = vec![0.0; k];
    let mut d = vec![0.0; k];

    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..k {
        let denom = diag[i] - sub[i] * c[i - 1];
        c[i] = if i + 1 < k { sup[i] / denom } else { 0.0 };
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / denom;
    }

    let mut x = vec![0.0; k];
    x[k - 1] = d[k - 1];
    for i in (0..k - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    x
}
