//! Evenly spaced evaluation grids.

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// The last value is exactly `stop` (no accumulated rounding), so a grid built
/// from an observed range always spans exactly that range.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as f64 - 1.0);
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// Evaluate `f` on `linspace(start, stop, n)`.
pub fn sample_fn(start: f64, stop: f64, n: usize, f: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
    linspace(start, stop, n).into_iter().map(|x| (x, f(x))).collect()
}
