//! Cubic interpolating spline.
//!
//! The spline is stored in second-derivative form (`m_i = s''(x_i)`), which
//! keeps evaluation a closed-form expression per interval. End conditions are
//! "not-a-knot": the third derivative is continuous across the second and the
//! second-to-last knot. Cubic data is reproduced exactly.
//!
//! Degenerate sizes fall back to the lowest-order interpolant:
//! three points give the parabola through them, two points give a line.

use nalgebra::{DMatrix, DVector};

/// Interpolating cubic spline through strictly increasing knots.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build the spline. `xs` must be strictly increasing and finite.
    ///
    /// Returns `None` for fewer than two knots or invalid input.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return None;
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return None;
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        let m = match n {
            2 => vec![0.0; 2],
            3 => {
                let c = 2.0 * (slope[1] - slope[0]) / (h[0] + h[1]);
                vec![c; 3]
            }
            _ => not_a_knot_moments(&h, &slope)?,
        };

        Some(Self { xs, ys, m })
    }

    /// Evaluate at `x`; outside the knot range the end polynomial is extended.
    pub fn eval(&self, x: f64) -> f64 {
        let xs = &self.xs;
        let hi = match xs.partition_point(|&v| v < x) {
            i if i >= xs.len() => xs.len() - 1,
            0 => 1,
            i => i,
        };
        let lo = hi - 1;

        let diff = xs[hi] - xs[lo];
        let a = (xs[hi] - x) / diff;
        let b = (x - xs[lo]) / diff;

        a * self.ys[lo]
            + b * self.ys[hi]
            + (diff * diff / 6.0)
                * ((a * a - 1.0) * a * self.m[lo] + (b * b - 1.0) * b * self.m[hi])
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

/// Sort `(x, y)` by x and average the y values of repeated x, producing valid knots.
pub fn prepare_knots(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .copied()
        .zip(y.iter().copied())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut xs: Vec<f64> = Vec::with_capacity(pairs.len());
    let mut ys: Vec<f64> = Vec::with_capacity(pairs.len());
    let mut counts: Vec<usize> = Vec::with_capacity(pairs.len());
    for (xv, yv) in pairs {
        match xs.last() {
            Some(&last) if last == xv => {
                let k = ys.len() - 1;
                ys[k] += yv;
                counts[k] += 1;
            }
            _ => {
                xs.push(xv);
                ys.push(yv);
                counts.push(1);
            }
        }
    }
    for (yv, c) in ys.iter_mut().zip(counts.iter()) {
        *yv /= *c as f64;
    }
    (xs, ys)
}

fn not_a_knot_moments(h: &[f64], slope: &[f64]) -> Option<Vec<f64>> {
    let n = h.len() + 1;
    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut rhs = DVector::<f64>::zeros(n);

    // Third-derivative continuity at x_1.
    a[(0, 0)] = -h[1];
    a[(0, 1)] = h[0] + h[1];
    a[(0, 2)] = -h[0];

    for i in 1..n - 1 {
        a[(i, i - 1)] = h[i - 1];
        a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        a[(i, i + 1)] = h[i];
        rhs[i] = 6.0 * (slope[i] - slope[i - 1]);
    }

    // Third-derivative continuity at x_{n-2}.
    a[(n - 1, n - 3)] = -h[n - 2];
    a[(n - 1, n - 2)] = h[n - 3] + h[n - 2];
    a[(n - 1, n - 1)] = -h[n - 3];

    let m = a.lu().solve(&rhs)?;
    if m.iter().all(|v| v.is_finite()) {
        Some(m.iter().copied().collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_knots() {
        let x = vec![1.0, 1.5, 2.2, 2.4, 3.0, 3.1];
        let y = vec![50.0, 90.0, 120.0, 140.0, 160.0, 200.0];
        let s = CubicSpline::new(x.clone(), y.clone()).unwrap();
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            assert!((s.eval(xi) - yi).abs() < 1e-9, "at x={xi}");
        }
    }

    #[test]
    fn reproduces_a_cubic() {
        let f = |x: f64| 2.0 - x + 0.5 * x * x + 0.25 * x * x * x;
        let x = vec![0.0, 0.7, 1.1, 2.0, 2.6, 4.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let s = CubicSpline::new(x, y).unwrap();
        for &t in &[0.3, 1.5, 2.3, 3.3] {
            assert!((s.eval(t) - f(t)).abs() < 1e-9, "at t={t}");
        }

        // Four knots: the not-a-knot system collapses to the single interpolating cubic.
        let x4 = vec![0.0, 1.0, 2.5, 3.0];
        let y4: Vec<f64> = x4.iter().map(|&v| f(v)).collect();
        let s4 = CubicSpline::new(x4, y4).unwrap();
        assert!((s4.eval(1.7) - f(1.7)).abs() < 1e-9);
    }

    #[test]
    fn small_sizes_fall_back() {
        let line = CubicSpline::new(vec![0.0, 2.0], vec![1.0, 5.0]).unwrap();
        assert!((line.eval(0.5) - 2.0).abs() < 1e-12);

        let para = CubicSpline::new(vec![0.0, 1.0, 3.0], vec![0.0, 1.0, 9.0]).unwrap();
        assert!((para.eval(2.0) - 4.0).abs() < 1e-12);

        assert!(CubicSpline::new(vec![1.0], vec![1.0]).is_none());
        assert!(CubicSpline::new(vec![1.0, 1.0], vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn prepare_knots_sorts_and_merges() {
        let (xs, ys) = prepare_knots(&[2.0, 1.0, 2.0, 3.0], &[4.0, 1.0, 6.0, 9.0]);
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(ys, vec![1.0, 5.0, 9.0]);
    }
}
